//! `coyo subset` – shuffle a record dump and keep a percentage of it.

use anyhow::Result;
use coyo_core::subset;
use std::path::Path;

pub fn run_subset(
    source: &Path,
    cache_dir: &Path,
    subset_name: &str,
    percentage: f64,
    seed: u64,
) -> Result<()> {
    let path = subset::create_subset(source, cache_dir, subset_name, percentage, seed)?;
    println!("Subset saved to {}", path.display());
    Ok(())
}
