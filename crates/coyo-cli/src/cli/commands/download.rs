//! `coyo download` – fetch the image of every record in a subset.

use anyhow::Result;
use coyo_core::config::FetchConfig;
use coyo_core::fetch::{self, BatchSelection, FetchOptions, FetchRequest};
use coyo_core::records;
use std::path::Path;

use crate::cli::progress::BatchProgress;

pub async fn run_download(
    cfg: &FetchConfig,
    subset_path: &Path,
    image_directory: &Path,
    concurrency: Option<usize>,
    selection: BatchSelection,
) -> Result<()> {
    let records = records::read_records(subset_path)?;
    let requests: Vec<FetchRequest> =
        selection.apply(records.iter().map(FetchRequest::from).collect());
    tracing::info!(
        records = records.len(),
        selected = requests.len(),
        "download batch prepared"
    );

    let mut opts = FetchOptions::from_config(cfg);
    if let Some(n) = concurrency {
        opts.concurrency = n;
    }

    let progress = BatchProgress::new(requests.len() as u64, "Downloading images");
    let summary = fetch::fetch_all(requests, image_directory, &opts, |outcome, done| {
        progress.report(outcome, done)
    })
    .await?;
    progress.finish(summary.to_string());
    Ok(())
}
