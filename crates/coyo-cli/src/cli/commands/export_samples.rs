//! `coyo export-samples` – write curation-tool sample documents.

use anyhow::Result;
use coyo_core::{records, samples};
use std::path::Path;

pub fn run_export_samples(dataset_path: &Path, output: &Path) -> Result<()> {
    let records = records::read_records(dataset_path)?;
    let export = samples::build_export(&records);
    samples::write_export(output, &export)?;
    println!(
        "Exported {} sample(s) to {}",
        export.samples.len(),
        output.display()
    );
    Ok(())
}
