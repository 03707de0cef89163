//! Single-request GET: content-type/status check, then stream body to `{id}.{ext}`.

use std::path::Path;

use curl::easy::Easy2;

use super::handler::{write_failure, ImageHandler, Verdict};
use super::{FetchOptions, FetchOutcome, FetchRequest, FetchStatus};

/// Fetches one image and classifies the result. Never returns an error:
/// every failure becomes a `Failed` outcome.
///
/// Blocks the current thread; call from `spawn_blocking` if used from async code.
pub fn fetch_one(request: &FetchRequest, destination_dir: &Path, opts: &FetchOptions) -> FetchOutcome {
    let path = destination_dir.join(request.file_name(&opts.file_extension));
    match perform(request, path, opts) {
        Ok(status) => FetchOutcome {
            id: request.id,
            status,
        },
        Err(e) => FetchOutcome::error(request.id, e.to_string()),
    }
}

fn perform(
    request: &FetchRequest,
    path: std::path::PathBuf,
    opts: &FetchOptions,
) -> Result<FetchStatus, curl::Error> {
    let mut easy = Easy2::new(ImageHandler::new(path, opts.content_type_case_sensitive));
    easy.url(&request.url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    // Read timeout: abort when under 1 byte/s arrives for `read_timeout`.
    easy.low_speed_limit(1)?;
    easy.low_speed_time(opts.read_timeout)?;
    if let Some(cap) = opts.max_transfer {
        easy.timeout(cap)?;
    }

    let performed = easy.perform();

    let handler = easy.get_mut();
    if let Some(e) = handler.write_error.take() {
        handler.discard_partial();
        return Ok(write_failure(&handler.file_path, &e));
    }
    // A rejected response aborts the transfer with a write error; the verdict is the outcome.
    if let Some(Verdict::Reject(status)) = handler.verdict.clone() {
        return Ok(status);
    }
    if let Err(e) = performed {
        handler.discard_partial();
        return Err(e);
    }

    let code = easy.response_code()?;
    let handler = easy.get_mut();
    let status = handler.finish(code);
    tracing::trace!(id = request.id, code, bytes = handler.bytes_written, "transfer finished");
    Ok(status)
}
