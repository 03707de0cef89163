//! Human-readable status lines and batch counters.

use std::fmt;

use super::{FetchFailure, FetchOutcome, FetchStatus};

impl fmt::Display for FetchOutcome {
    /// One status line per outcome, e.g. `Downloaded 42` or `Failed 7: Status code 404`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            FetchStatus::Downloaded => write!(f, "Downloaded {}", self.id),
            FetchStatus::Skipped(reason) => write!(f, "Skipped {}: {}", self.id, reason),
            FetchStatus::Failed(FetchFailure::Status(code)) => {
                write!(f, "Failed {}: Status code {}", self.id, code)
            }
            FetchStatus::Failed(FetchFailure::Error(err)) => {
                write!(f, "Skipped {} due to error: {}", self.id, err)
            }
        }
    }
}

/// Completed/total count, advanced once per outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchProgress {
    pub completed: usize,
    pub total: usize,
}

impl FetchProgress {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }
}

/// Per-kind counts for a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl FetchSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, status: &FetchStatus) {
        match status {
            FetchStatus::Downloaded => self.downloaded += 1,
            FetchStatus::Skipped(_) => self.skipped += 1,
            FetchStatus::Failed(_) => self.failed += 1,
        }
    }

    pub fn completed(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }
}

impl fmt::Display for FetchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} downloaded, {} skipped, {} failed ({} of {} completed)",
            self.downloaded,
            self.skipped,
            self.failed,
            self.completed(),
            self.total
        )
    }
}
