//! Easy2 Handler for one image request.
//! Checks Content-Type and status before the first body byte; writes the body to the output file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::str;

use super::{FetchFailure, FetchStatus, SkipReason};

/// Decision taken once response headers are complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Verdict {
    /// Status 200 with an image content type: stream body to disk.
    Write,
    /// Do not write; the transfer is aborted and this becomes the outcome.
    Reject(FetchStatus),
}

/// Handler state for one image transfer. Implements curl's Handler for Easy2.
pub(super) struct ImageHandler {
    pub(super) file_path: PathBuf,
    case_sensitive: bool,
    pub(super) response_headers: Vec<String>,
    pub(super) verdict: Option<Verdict>,
    file: Option<File>,
    pub(super) bytes_written: u64,
    pub(super) write_error: Option<io::Error>,
}

impl ImageHandler {
    pub(super) fn new(file_path: PathBuf, case_sensitive: bool) -> Self {
        Self {
            file_path,
            case_sensitive,
            response_headers: Vec::new(),
            verdict: None,
            file: None,
            bytes_written: 0,
            write_error: None,
        }
    }

    fn decide(&mut self, status: Option<u32>) -> Verdict {
        let status = status.or_else(|| parse_http_status(&self.response_headers));
        let content_type = header_value(&self.response_headers, "content-type").unwrap_or("");
        let verdict = classify(status, content_type, self.case_sensitive);
        self.verdict = Some(verdict.clone());
        verdict
    }

    fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        if self.file.is_none() {
            self.file = Some(File::create(&self.file_path)?);
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(data)?;
        }
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Final status after a successful transfer. `response_code` is curl's view of the
    /// final response; it is only consulted when no body arrived to trigger the decision.
    pub(super) fn finish(&mut self, response_code: u32) -> FetchStatus {
        let verdict = match self.verdict.clone() {
            Some(v) => v,
            None => self.decide(Some(response_code)),
        };
        match verdict {
            Verdict::Reject(status) => status,
            Verdict::Write => {
                let flushed = match self.file.take() {
                    Some(mut f) => f.flush(),
                    // Empty body: still leave an (empty) file behind.
                    None => File::create(&self.file_path).map(|_| ()),
                };
                match flushed {
                    Ok(()) => FetchStatus::Downloaded,
                    Err(e) => write_failure(&self.file_path, &e),
                }
            }
        }
    }

    /// Removes a file left by a transfer that failed after the body started.
    pub(super) fn discard_partial(&mut self) {
        if self.file.take().is_none() {
            return;
        }
        if let Err(e) = fs::remove_file(&self.file_path) {
            tracing::warn!(path = %self.file_path.display(), "remove partial image: {}", e);
        } else {
            tracing::debug!(path = %self.file_path.display(), "removed partial image");
        }
    }
}

impl curl::easy::Handler for ImageHandler {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            if line.starts_with("HTTP/") {
                self.response_headers.clear();
            }
            if !line.is_empty() {
                self.response_headers.push(line.to_string());
            }
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        let verdict = match self.verdict.clone() {
            Some(v) => v,
            None => self.decide(None),
        };
        if verdict != Verdict::Write {
            return Ok(0);
        }
        match self.write_chunk(data) {
            Ok(()) => Ok(data.len()),
            Err(e) => {
                tracing::warn!(path = %self.file_path.display(), "image write failed: {}", e);
                self.write_error = Some(e);
                Ok(0) // abort transfer
            }
        }
    }
}

pub(super) fn write_failure(path: &std::path::Path, e: &io::Error) -> FetchStatus {
    FetchStatus::Failed(FetchFailure::Error(format!(
        "write {}: {}",
        path.display(),
        e
    )))
}

/// A response without "image" in the content type is skipped whatever its
/// status; an image response with a status other than 200 fails.
pub(super) fn classify(status: Option<u32>, content_type: &str, case_sensitive: bool) -> Verdict {
    if !is_image_content_type(content_type, case_sensitive) {
        return Verdict::Reject(FetchStatus::Skipped(SkipReason::NotAnImage));
    }
    match status {
        Some(200) => Verdict::Write,
        Some(code) => Verdict::Reject(FetchStatus::Failed(FetchFailure::Status(code))),
        None => Verdict::Reject(FetchStatus::Failed(FetchFailure::Error(
            "response has no HTTP status line".to_string(),
        ))),
    }
}

pub(super) fn is_image_content_type(content_type: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        content_type.contains("image")
    } else {
        content_type.to_ascii_lowercase().contains("image")
    }
}

/// Status code from the first line of the current response (e.g. `HTTP/1.1 404 Not Found`).
pub(super) fn parse_http_status(lines: &[String]) -> Option<u32> {
    let first = lines.first()?;
    if !first.starts_with("HTTP/") {
        return None;
    }
    first.split_whitespace().nth(1)?.parse().ok()
}

/// Value of the last header called `name` (case-insensitive).
pub(super) fn header_value<'a>(lines: &'a [String], name: &str) -> Option<&'a str> {
    lines
        .iter()
        .filter_map(|line| line.split_once(':'))
        .filter(|(n, _)| n.trim().eq_ignore_ascii_case(name))
        .map(|(_, v)| v.trim())
        .last()
}
