//! End-to-end uploads through a real child process
//!
//! A small shell script stands in for the upload program. It records its
//! argv and auth variable, prints to both streams and exits with a chosen
//! code.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use putqueue_core::domain::{Credentials, HostPort, RunOutcome, StreamKind};
use putqueue_core::ports::IUploadQueue;
use putqueue_worker::{InMemoryUploadQueue, TokioProcessRunner, UploadWorker, WorkerSettings};

use crate::common::{write_file, RecordingLogSink, RecordingStatusSink};

fn write_fake_uploader(dir: &Path, record: &Path, exit_code: i32) -> PathBuf {
    let script = dir.join("camput.bin");
    let body = format!(
        "#!/bin/sh\n\
         printf '%s\\n' \"$@\" > '{record}'\n\
         printf '%s\\n' \"$CAMLI_AUTH\" >> '{record}'\n\
         echo \"sha224-fake\"\n\
         echo \"uploading $4\" >&2\n\
         exit {exit_code}\n",
        record = record.display(),
    );
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn build_worker(
    executable: PathBuf,
    queue: Arc<InMemoryUploadQueue>,
) -> (UploadWorker, Arc<RecordingStatusSink>, Arc<RecordingLogSink>) {
    let status = Arc::new(RecordingStatusSink::new());
    let log = Arc::new(RecordingLogSink::new());
    let mut settings = WorkerSettings::new(executable);
    settings.drain_grace = Duration::from_secs(5);

    let worker = UploadWorker::new(
        HostPort::new("localhost:3179"),
        Credentials::new("alice", "s3cret"),
        settings,
        queue,
        Arc::new(TokioProcessRunner::new()),
    )
    .with_status_sink(status.clone())
    .with_log_sink(log.clone());
    (worker, status, log)
}

#[tokio::test]
async fn test_real_child_receives_contract_and_output_is_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    let record = dir.path().join("record.txt");
    let executable = write_fake_uploader(dir.path(), &record, 0);
    let photo = write_file(dir.path(), "photo.jpg", 16);

    let queue = Arc::new(InMemoryUploadQueue::new());
    queue.enqueue_path(&photo).await;
    let (worker, status, log) = build_worker(executable, queue.clone());

    let outcome = worker.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Done);
    assert!(queue.is_empty().await);

    let canonical = std::fs::canonicalize(&photo).unwrap();
    let recorded = std::fs::read_to_string(&record).unwrap();
    let lines: Vec<&str> = recorded.lines().collect();
    assert_eq!(
        lines,
        vec![
            "--server=http://localhost:3179".to_string(),
            "file".to_string(),
            "-vivify".to_string(),
            canonical.display().to_string(),
            "userpass:alice:s3cret".to_string(),
        ]
    );

    assert_eq!(log.lines_for(StreamKind::Stdout), vec!["sha224-fake"]);
    assert_eq!(
        log.lines_for(StreamKind::Stderr),
        vec![format!("uploading {}", canonical.display())]
    );
    assert!(status
        .texts()
        .contains(&format!("Uploaded {}", canonical.display())));
}

#[tokio::test]
async fn test_real_child_nonzero_exit_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let record = dir.path().join("record.txt");
    let executable = write_fake_uploader(dir.path(), &record, 3);
    let photo = write_file(dir.path(), "photo.jpg", 16);

    let queue = Arc::new(InMemoryUploadQueue::new());
    queue.enqueue_path(&photo).await;
    let (worker, _status, _log) = build_worker(executable, queue.clone());

    let outcome = worker.run().await.unwrap();

    match outcome {
        RunOutcome::Aborted { exit, .. } => assert_eq!(exit.code, Some(3)),
        other => panic!("expected aborted run, got {other:?}"),
    }
    assert_eq!(queue.len().await, 1);
}

#[tokio::test]
async fn test_missing_executable_is_launch_error() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_file(dir.path(), "photo.jpg", 16);

    let queue = Arc::new(InMemoryUploadQueue::new());
    queue.enqueue_path(&photo).await;
    let (worker, status, _log) = build_worker(dir.path().join("missing.bin"), queue.clone());

    let err = worker.run().await.unwrap_err();

    assert!(err.is_launch());
    assert_eq!(queue.len().await, 1);
    assert!(worker.counters().is_zero());
    assert_eq!(status.last_bytes(), Some(0));
}
