//! Deterministic random subset of a record set.
//!
//! Records are shuffled with a seeded RNG and the first `percentage`% are
//! kept, so the same input and seed always produce the same subset.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};

use crate::records::{self, Record};

/// Number of records kept out of `len` for `percentage` (truncated toward zero).
pub fn subset_size(len: usize, percentage: f64) -> usize {
    ((len as f64) * (percentage / 100.0)).floor() as usize
}

/// Shuffles `records` with `seed` and keeps `percentage`% of them.
pub fn select_subset(mut records: Vec<Record>, percentage: f64, seed: u64) -> Result<Vec<Record>> {
    if !(0.0..=100.0).contains(&percentage) {
        anyhow::bail!("subset percentage must be within 0..=100, got {}", percentage);
    }
    let size = subset_size(records.len(), percentage);
    let mut rng = StdRng::seed_from_u64(seed);
    records.shuffle(&mut rng);
    records.truncate(size);
    Ok(records)
}

/// Reads `source`, selects a subset and saves it as `{cache_dir}/{subset_name}/records.jsonl`.
/// Returns the saved file path.
pub fn create_subset(
    source: &Path,
    cache_dir: &Path,
    subset_name: &str,
    percentage: f64,
    seed: u64,
) -> Result<PathBuf> {
    fs::create_dir_all(cache_dir)
        .with_context(|| format!("failed to create cache dir {}", cache_dir.display()))?;
    let all = records::read_records(source)?;
    let total = all.len();
    let subset = select_subset(all, percentage, seed)?;
    let path = records::save_dataset(&cache_dir.join(subset_name), &subset)?;
    tracing::info!(
        total,
        kept = subset.len(),
        path = %path.display(),
        "subset saved"
    );
    Ok(path)
}
