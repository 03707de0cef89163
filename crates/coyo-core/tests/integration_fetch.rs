//! Integration test: local HTTP server with image, non-image, error and slow routes.
//!
//! Runs batches through `fetch_all` and checks outcome classification, the
//! files left in the destination directory, and progress reporting.

mod common;

use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use coyo_core::fetch::{
    fetch_all, fetch_one, FetchFailure, FetchOptions, FetchOutcome, FetchRequest, FetchSetupError,
    FetchStatus, FetchStatusKind, SkipReason,
};
use common::image_server;
use tempfile::tempdir;

fn options(concurrency: usize) -> FetchOptions {
    let mut opts = FetchOptions::default().with_concurrency(concurrency);
    opts.connect_timeout = Duration::from_secs(2);
    opts.read_timeout = Duration::from_secs(2);
    opts
}

async fn run(requests: Vec<FetchRequest>, dir: &std::path::Path, concurrency: usize) -> Vec<FetchOutcome> {
    let mut outcomes = Vec::new();
    fetch_all(requests, dir, &options(concurrency), |o, _| outcomes.push(o.clone()))
        .await
        .expect("fetch_all");
    outcomes
}

fn by_id(outcomes: &[FetchOutcome]) -> HashMap<i64, FetchStatus> {
    outcomes.iter().map(|o| (o.id, o.status.clone())).collect()
}

fn mixed_batch(base: &str) -> Vec<FetchRequest> {
    vec![
        FetchRequest::new(1, format!("{}/img/1", base)),
        FetchRequest::new(2, format!("{}/img/2", base)),
        FetchRequest::new(3, format!("{}/html", base)),
        FetchRequest::new(4, format!("{}/nothing-here", base)),
        FetchRequest::new(5, format!("{}/missing-image", base)),
        FetchRequest::new(6, image_server::dead_url()),
        FetchRequest::new(7, format!("{}/redirect/7", base)),
        FetchRequest::new(8, format!("{}/upper/8", base)),
        FetchRequest::new(9, "not a url at all".to_string()),
    ]
}

#[tokio::test]
async fn mixed_batch_yields_one_outcome_per_request() {
    let base = image_server::start();
    let dir = tempdir().unwrap();
    let images = dir.path().join("nested").join("images");

    let outcomes = run(mixed_batch(&base), &images, 4).await;
    assert_eq!(outcomes.len(), 9);
    let status = by_id(&outcomes);
    assert_eq!(status.len(), 9, "every id reported exactly once");

    assert_eq!(status[&1], FetchStatus::Downloaded);
    assert_eq!(status[&2], FetchStatus::Downloaded);
    assert_eq!(status[&3], FetchStatus::Skipped(SkipReason::NotAnImage));
    assert_eq!(
        status[&4],
        FetchStatus::Skipped(SkipReason::NotAnImage),
        "non-image content type is checked before the status"
    );
    assert_eq!(status[&5], FetchStatus::Failed(FetchFailure::Status(404)));
    match &status[&6] {
        FetchStatus::Failed(FetchFailure::Error(msg)) => assert!(!msg.is_empty()),
        other => panic!("expected connection failure, got {:?}", other),
    }
    assert_eq!(status[&7], FetchStatus::Downloaded, "redirects are followed");
    assert_eq!(status[&8], FetchStatus::Downloaded, "content type matched ignoring case");
    assert_eq!(status[&9].kind(), FetchStatusKind::Failed);

    assert_eq!(fs::read(images.join("1.jpg")).unwrap(), image_server::image_body(1));
    assert_eq!(fs::read(images.join("2.jpg")).unwrap(), image_server::image_body(2));
    assert_eq!(fs::read(images.join("7.jpg")).unwrap(), image_server::image_body(7));
    for id in [3, 4, 5, 6, 9] {
        assert!(!images.join(format!("{}.jpg", id)).exists(), "no file for {}", id);
    }
}

#[tokio::test]
async fn status_lines_match_report_format() {
    let base = image_server::start();
    let dir = tempdir().unwrap();
    let outcomes = run(mixed_batch(&base), dir.path(), 2).await;
    let lines: HashMap<i64, String> = outcomes.iter().map(|o| (o.id, o.to_string())).collect();
    assert_eq!(lines[&1], "Downloaded 1");
    assert_eq!(lines[&3], "Skipped 3: Content is not an image");
    assert_eq!(lines[&4], "Skipped 4: Content is not an image");
    assert_eq!(lines[&5], "Failed 5: Status code 404");
    assert!(lines[&6].starts_with("Skipped 6 due to error: "));
}

#[tokio::test]
async fn timeout_fails_only_that_request() {
    let base = image_server::start();
    let dir = tempdir().unwrap();
    let mut opts = options(2);
    opts.read_timeout = Duration::from_secs(1);
    let requests = vec![
        FetchRequest::new(1, format!("{}/slow", base)),
        FetchRequest::new(2, format!("{}/img/2", base)),
    ];
    let mut outcomes = Vec::new();
    let summary = fetch_all(requests, dir.path(), &opts, |o, _| outcomes.push(o.clone()))
        .await
        .unwrap();

    let status = by_id(&outcomes);
    match &status[&1] {
        FetchStatus::Failed(FetchFailure::Error(msg)) => assert!(!msg.is_empty()),
        other => panic!("expected timeout failure, got {:?}", other),
    }
    assert_eq!(status[&2], FetchStatus::Downloaded);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.failed, 1);
    assert!(!dir.path().join("1.jpg").exists());
}

#[tokio::test]
async fn slow_but_steady_body_is_not_timed_out() {
    let base = image_server::start();
    let dir = tempdir().unwrap();
    // Whole body takes longer than the read timeout, but bytes keep arriving.
    let opts = options(1);
    assert!(image_server::TRICKLE_INTERVAL * image_server::TRICKLE_BODY.len() as u32 > opts.read_timeout);

    let outcome = fetch_one(&FetchRequest::new(21, format!("{}/trickle", base)), dir.path(), &opts);
    assert_eq!(outcome.status, FetchStatus::Downloaded);
    assert_eq!(fs::read(dir.path().join("21.jpg")).unwrap(), image_server::TRICKLE_BODY);
}

#[tokio::test]
async fn transfer_cap_still_applies_when_set() {
    let base = image_server::start();
    let dir = tempdir().unwrap();
    let mut opts = options(1);
    opts.max_transfer = Some(Duration::from_secs(1));

    let outcome = fetch_one(&FetchRequest::new(22, format!("{}/trickle", base)), dir.path(), &opts);
    assert_eq!(outcome.status.kind(), FetchStatusKind::Failed);
    assert!(!dir.path().join("22.jpg").exists(), "partial body removed");
}

#[tokio::test]
async fn connection_lost_mid_body_leaves_no_file() {
    let base = image_server::start();
    let dir = tempdir().unwrap();
    let outcomes = run(vec![FetchRequest::new(23, format!("{}/truncated", base))], dir.path(), 1).await;
    match &outcomes[0].status {
        FetchStatus::Failed(FetchFailure::Error(msg)) => assert!(!msg.is_empty()),
        other => panic!("expected transfer error, got {:?}", other),
    }
    assert!(!dir.path().join("23.jpg").exists());
}

#[tokio::test]
async fn progress_advances_once_per_outcome() {
    let base = image_server::start();
    let dir = tempdir().unwrap();
    let requests: Vec<FetchRequest> = (1..=6)
        .map(|i| FetchRequest::new(i, format!("{}/img/{}", base, i)))
        .collect();
    let mut seen = Vec::new();
    let summary = fetch_all(requests, dir.path(), &options(3), |_, p| seen.push(p))
        .await
        .unwrap();
    let completed: Vec<usize> = seen.iter().map(|p| p.completed).collect();
    assert_eq!(completed, vec![1, 2, 3, 4, 5, 6]);
    assert!(seen.iter().all(|p| p.total == 6));
    assert_eq!(summary.downloaded, 6);
    assert_eq!(summary.completed(), 6);
}

#[tokio::test]
async fn rerun_overwrites_with_identical_content() {
    let base = image_server::start();
    let dir = tempdir().unwrap();
    let requests = vec![FetchRequest::new(3, format!("{}/img/3", base))];

    fs::write(dir.path().join("3.jpg"), b"stale bytes that are longer than nothing").unwrap();
    run(requests.clone(), dir.path(), 1).await;
    let first = fs::read(dir.path().join("3.jpg")).unwrap();
    run(requests, dir.path(), 1).await;
    let second = fs::read(dir.path().join("3.jpg")).unwrap();

    assert_eq!(first, image_server::image_body(3));
    assert_eq!(first, second);
}

#[tokio::test]
async fn concurrency_does_not_change_classification() {
    let base = image_server::start();
    let serial_dir = tempdir().unwrap();
    let parallel_dir = tempdir().unwrap();

    let kinds = |outcomes: Vec<FetchOutcome>| -> HashMap<i64, FetchStatusKind> {
        outcomes.into_iter().map(|o| (o.id, o.status.kind())).collect()
    };
    let serial = kinds(run(mixed_batch(&base), serial_dir.path(), 1).await);
    let parallel = kinds(run(mixed_batch(&base), parallel_dir.path(), 8).await);
    assert_eq!(serial, parallel);
}

#[tokio::test]
async fn empty_body_image_leaves_empty_file() {
    let base = image_server::start();
    let dir = tempdir().unwrap();
    let outcomes = run(vec![FetchRequest::new(11, format!("{}/empty", base))], dir.path(), 1).await;
    assert_eq!(outcomes[0].status, FetchStatus::Downloaded);
    assert_eq!(fs::read(dir.path().join("11.jpg")).unwrap().len(), 0);
}

#[tokio::test]
async fn case_sensitive_matching_skips_uppercase_type() {
    let base = image_server::start();
    let dir = tempdir().unwrap();
    let mut opts = options(1);
    opts.content_type_case_sensitive = true;
    let outcome = fetch_one(&FetchRequest::new(8, format!("{}/upper/8", base)), dir.path(), &opts);
    assert_eq!(outcome.status, FetchStatus::Skipped(SkipReason::NotAnImage));
    assert!(!dir.path().join("8.jpg").exists());
}

#[tokio::test]
async fn empty_batch_still_creates_directory() {
    let dir = tempdir().unwrap();
    let images = dir.path().join("images");
    let summary = fetch_all(Vec::new(), &images, &options(2), |_, _| panic!("no outcomes expected"))
        .await
        .unwrap();
    assert!(images.is_dir());
    assert_eq!(summary.completed(), 0);
}

#[tokio::test]
async fn zero_concurrency_is_a_setup_error() {
    let dir = tempdir().unwrap();
    let err = fetch_all(
        vec![FetchRequest::new(1, "http://127.0.0.1:1/")],
        dir.path(),
        &options(0),
        |_, _| panic!("nothing should be dispatched"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, FetchSetupError::InvalidConcurrency));
}

#[tokio::test]
async fn uncreatable_destination_is_a_setup_error() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, b"x").unwrap();
    let err = fetch_all(
        vec![FetchRequest::new(1, "http://127.0.0.1:1/")],
        &blocker.join("images"),
        &options(1),
        |_, _| panic!("nothing should be dispatched"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, FetchSetupError::CreateDir { .. }));
}
