//! Dataset records stored as JSON Lines.
//!
//! A dataset location is either a `.jsonl` file or a directory holding
//! `records.jsonl`. Fields other than `id`, `url` and `image_path` are carried
//! through untouched so captions and scores survive subset and filter steps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name used when a dataset location is a directory.
pub const RECORDS_FILE: &str = "records.jsonl";

/// One upstream dataset entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub url: String,
    /// Local image file, set once the image is known to be on disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            image_path: None,
            extra: Map::new(),
        }
    }

    /// Extra field by name; `null` values count as absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name).filter(|v| !v.is_null())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}: invalid record: {source}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("{}: serialize record: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Maps a dataset location to the JSON Lines file behind it.
pub fn resolve_records_path(location: &Path) -> PathBuf {
    if location.is_dir() {
        location.join(RECORDS_FILE)
    } else {
        location.to_path_buf()
    }
}

/// Reads all records from a dataset location. Blank lines are ignored.
pub fn read_records(location: &Path) -> Result<Vec<Record>, RecordsError> {
    let path = resolve_records_path(location);
    let io_err = |source| RecordsError::Io {
        path: path.clone(),
        source,
    };
    let reader = BufReader::new(File::open(&path).map_err(io_err)?);

    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|source| RecordsError::Parse {
            path: path.clone(),
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    tracing::debug!(path = %path.display(), count = records.len(), "read records");
    Ok(records)
}

/// Writes records to `path` as JSON Lines, creating parent directories.
pub fn write_records(path: &Path, records: &[Record]) -> Result<(), RecordsError> {
    let io_err = |source| RecordsError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    for record in records {
        serde_json::to_writer(&mut writer, record).map_err(|source| RecordsError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        writer.write_all(b"\n").map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;
    Ok(())
}

/// Saves records as a dataset directory (`{dir}/records.jsonl`) and returns the file path.
pub fn save_dataset(dir: &Path, records: &[Record]) -> Result<PathBuf, RecordsError> {
    let path = dir.join(RECORDS_FILE);
    write_records(&path, records)?;
    Ok(path)
}
