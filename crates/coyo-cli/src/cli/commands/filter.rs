//! `coyo filter` – keep records whose image is on disk and cache them.

use anyhow::Result;
use coyo_core::filter;
use std::path::Path;

pub fn run_filter(
    subset_path: &Path,
    image_directory: &Path,
    cache_path: &Path,
    dataset_name: &str,
) -> Result<()> {
    let (kept, path) =
        filter::filter_downloaded(subset_path, image_directory, cache_path, dataset_name)?;
    println!("Cached {} record(s) at {}", kept, path.display());
    Ok(())
}
