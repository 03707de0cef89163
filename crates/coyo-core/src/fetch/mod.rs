//! Bounded-concurrency, best-effort image fetcher.
//!
//! Each [`FetchRequest`] is turned into exactly one [`FetchOutcome`]: the image
//! is saved as `{id}.{ext}` (`Downloaded`), ignored because the server did not
//! send an image (`Skipped`), or not saved because of an HTTP status or a
//! transport/filesystem error (`Failed`). Individual failures never abort the
//! batch; only setup problems (bad concurrency, uncreatable destination) do.
//!
//! Transfers use blocking libcurl `Easy2` handles running on tokio's blocking
//! pool, with at most `concurrency` requests in flight.

mod handler;
mod pool;
mod report;
mod request;
mod select;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::records::Record;

pub use pool::fetch_all;
pub use report::{FetchProgress, FetchSummary};
pub use request::fetch_one;
pub use select::BatchSelection;

/// One unit of work: download `url` and save it under a name derived from `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: i64,
    pub url: String,
}

impl FetchRequest {
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self { id, url: url.into() }
    }

    /// Output file name, e.g. `"42.jpg"`.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.id, extension)
    }
}

impl From<&Record> for FetchRequest {
    fn from(record: &Record) -> Self {
        Self::new(record.id, record.url.clone())
    }
}

/// Why a request was skipped without writing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `Content-Type` did not mention "image".
    NotAnImage,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAnImage => write!(f, "Content is not an image"),
        }
    }
}

/// Why a request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Server answered with a status other than 200.
    Status(u32),
    /// Network, timeout, or filesystem error, flattened to its message.
    Error(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Status(code) => write!(f, "Status code {}", code),
            FetchFailure::Error(msg) => write!(f, "{}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Downloaded,
    Skipped(SkipReason),
    Failed(FetchFailure),
}

/// Classification without the reason payload; handy for comparing runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatusKind {
    Downloaded,
    Skipped,
    Failed,
}

impl FetchStatus {
    pub fn kind(&self) -> FetchStatusKind {
        match self {
            FetchStatus::Downloaded => FetchStatusKind::Downloaded,
            FetchStatus::Skipped(_) => FetchStatusKind::Skipped,
            FetchStatus::Failed(_) => FetchStatusKind::Failed,
        }
    }
}

/// Result of processing one [`FetchRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub id: i64,
    pub status: FetchStatus,
}

impl FetchOutcome {
    pub(crate) fn error(id: i64, message: impl Into<String>) -> Self {
        Self {
            id,
            status: FetchStatus::Failed(FetchFailure::Error(message.into())),
        }
    }
}

/// Per-batch fetch settings.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Maximum requests in flight. Must be at least 1.
    pub concurrency: usize,
    pub connect_timeout: Duration,
    /// Longest tolerated gap without received bytes once connected.
    pub read_timeout: Duration,
    /// Cap on the whole transfer; None = unbounded.
    pub max_transfer: Option<Duration>,
    pub content_type_case_sensitive: bool,
    pub file_extension: String,
}

impl FetchOptions {
    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self {
            concurrency: cfg.concurrency.unwrap_or_else(default_concurrency),
            connect_timeout: cfg.connect_timeout(),
            read_timeout: cfg.read_timeout(),
            max_transfer: cfg.max_transfer(),
            content_type_case_sensitive: cfg.content_type_case_sensitive,
            file_extension: cfg.file_extension.clone(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Number of processing units on this host (1 if unknown).
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Problems that stop a batch before any request is dispatched.
#[derive(Debug, thiserror::Error)]
pub enum FetchSetupError {
    #[error("concurrency must be at least 1")]
    InvalidConcurrency,
    #[error("sample fraction must be in (0, 1], got {0}")]
    InvalidSampleFraction(f64),
    #[error("failed to create destination directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
