//! Re-attach downloaded images to their records.
//!
//! Image files are named `{id}.{ext}`; the stem is the record id. Records
//! whose image never made it to disk are dropped.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::records::{self, Record};

/// Maps record id to image path for every regular file in `images_dir`.
/// Files whose stem is not an integer are skipped.
pub fn image_paths(images_dir: &Path) -> Result<HashMap<i64, PathBuf>> {
    let entries = fs::read_dir(images_dir)
        .with_context(|| format!("failed to read image directory {}", images_dir.display()))?;

    let mut map = HashMap::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read {}", images_dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let stem = path.file_stem().and_then(|s| s.to_str());
        match stem.and_then(|s| s.parse::<i64>().ok()) {
            Some(id) => {
                map.insert(id, path);
            }
            None => tracing::warn!(path = %path.display(), "ignoring file without numeric id"),
        }
    }
    tracing::debug!(dir = %images_dir.display(), count = map.len(), "scanned images");
    Ok(map)
}

/// Keeps records that have an image on disk and sets their `image_path`.
/// Order of the input is preserved.
pub fn attach_image_paths(records: Vec<Record>, paths: &HashMap<i64, PathBuf>) -> Vec<Record> {
    records
        .into_iter()
        .filter_map(|mut record| {
            let path = paths.get(&record.id)?;
            record.image_path = Some(path.to_string_lossy().into_owned());
            Some(record)
        })
        .collect()
}

/// Saves `records` under `{cache_path}/dataset/{dataset_name}/records.jsonl`.
pub fn cache_dataset(cache_path: &Path, records: &[Record], dataset_name: &str) -> Result<PathBuf> {
    let dir = cache_path.join("dataset").join(dataset_name);
    let path = records::save_dataset(&dir, records)
        .with_context(|| format!("failed to cache dataset '{}'", dataset_name))?;
    tracing::info!("dataset '{}' cached at {}", dataset_name, path.display());
    Ok(path)
}

/// Reads the subset, keeps records with downloaded images, caches the result.
pub fn filter_downloaded(
    subset_path: &Path,
    images_dir: &Path,
    cache_path: &Path,
    dataset_name: &str,
) -> Result<(usize, PathBuf)> {
    let all = records::read_records(subset_path)?;
    let total = all.len();
    let paths = image_paths(images_dir)?;
    let kept = attach_image_paths(all, &paths);
    tracing::info!(total, kept = kept.len(), "filtered records by downloaded image");
    let path = cache_dataset(cache_path, &kept, dataset_name)?;
    Ok((kept.len(), path))
}
