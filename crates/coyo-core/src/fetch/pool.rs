//! Run a batch of requests with at most `concurrency` in flight.
//!
//! Keeps up to `concurrency` blocking transfers running at once; when one
//! finishes, its outcome is reported and the next queued request is started
//! until the queue is empty. Outcomes arrive in completion order.

use std::collections::HashMap;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;

use super::report::{FetchProgress, FetchSummary};
use super::request::fetch_one;
use super::{FetchOptions, FetchOutcome, FetchRequest, FetchSetupError, FetchStatus};

/// Fetches every request into `destination_dir`, calling `on_outcome` once per
/// request as it completes together with the running progress count.
///
/// The destination directory is created (with parents) before any request is
/// dispatched. Returns an error only for setup problems; per-request failures
/// are reported through `on_outcome` and counted in the summary.
pub async fn fetch_all<F>(
    requests: Vec<FetchRequest>,
    destination_dir: &Path,
    opts: &FetchOptions,
    mut on_outcome: F,
) -> Result<FetchSummary, FetchSetupError>
where
    F: FnMut(&FetchOutcome, FetchProgress),
{
    if opts.concurrency == 0 {
        return Err(FetchSetupError::InvalidConcurrency);
    }
    fs::create_dir_all(destination_dir).map_err(|source| FetchSetupError::CreateDir {
        path: destination_dir.to_path_buf(),
        source,
    })?;

    let total = requests.len();
    tracing::info!(
        total,
        concurrency = opts.concurrency,
        dir = %destination_dir.display(),
        "fetch batch starting"
    );

    let dest: Arc<PathBuf> = Arc::new(destination_dir.to_path_buf());
    let shared_opts = Arc::new(opts.clone());
    let mut queue = requests.into_iter();
    let mut join_set = JoinSet::new();
    let mut summary = FetchSummary::new(total);
    let mut in_flight = InFlight::default();
    let mut report = |outcome: FetchOutcome, summary: &mut FetchSummary| {
        log_outcome(&outcome);
        summary.record(&outcome.status);
        on_outcome(
            &outcome,
            FetchProgress {
                completed: summary.completed(),
                total,
            },
        );
    };

    loop {
        while join_set.len() < opts.concurrency {
            let Some(request) = queue.next() else {
                break;
            };
            in_flight.start(request.id);
            let dest = Arc::clone(&dest);
            let opts = Arc::clone(&shared_opts);
            join_set.spawn_blocking(move || {
                panic::catch_unwind(AssertUnwindSafe(|| fetch_one(&request, &dest, &opts)))
                    .unwrap_or_else(|_| FetchOutcome::error(request.id, "fetch worker panicked"))
            });
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        match res {
            Ok(outcome) => {
                in_flight.finish(outcome.id);
                report(outcome, &mut summary);
            }
            // The id is unknown here; it is reported once the batch drains.
            Err(e) => tracing::error!("fetch task join: {}", e),
        }
    }

    for id in in_flight.drain_lost() {
        report(FetchOutcome::error(id, "fetch task failed"), &mut summary);
    }

    tracing::info!("fetch batch finished: {}", summary);
    Ok(summary)
}

/// Ids of spawned requests whose outcome has not been reported yet.
/// Counted per id so duplicate ids in one batch stay balanced.
#[derive(Debug, Default)]
struct InFlight(HashMap<i64, usize>);

impl InFlight {
    fn start(&mut self, id: i64) {
        *self.0.entry(id).or_insert(0) += 1;
    }

    fn finish(&mut self, id: i64) {
        if let Some(n) = self.0.get_mut(&id) {
            *n -= 1;
            if *n == 0 {
                self.0.remove(&id);
            }
        }
    }

    /// Requests that never produced an outcome, one entry per lost task.
    fn drain_lost(&mut self) -> Vec<i64> {
        let mut lost: Vec<i64> = self
            .0
            .drain()
            .flat_map(|(id, n)| std::iter::repeat(id).take(n))
            .collect();
        lost.sort_unstable();
        lost
    }
}

fn log_outcome(outcome: &FetchOutcome) {
    match &outcome.status {
        FetchStatus::Downloaded => tracing::debug!(id = outcome.id, "downloaded"),
        FetchStatus::Skipped(reason) => tracing::info!(id = outcome.id, "skipped: {}", reason),
        FetchStatus::Failed(failure) => tracing::warn!(id = outcome.id, "failed: {}", failure),
    }
}
