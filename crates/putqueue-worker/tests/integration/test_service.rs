//! UploadService supervision loop

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use putqueue_core::domain::{ProcessExit, QueueEntryId, RunOutcome};
use putqueue_core::ports::IUploadQueue;
use putqueue_worker::{ServiceSummary, UploadService};

use crate::common::{write_file, Harness, ScriptedRunner, Step};

const HOST: &str = "localhost:3179";

async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn service(h: &Harness, retry_delay: Duration) -> Arc<UploadService> {
    Arc::new(UploadService::new(
        h.worker.clone(),
        h.queue.clone(),
        retry_delay,
    ))
}

#[tokio::test]
async fn test_service_uploads_files_enqueued_while_idle() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_file(dir.path(), "a.jpg", 1);
    let b = write_file(dir.path(), "b.jpg", 1);
    let h = Harness::new(HOST, ScriptedRunner::new());
    let svc = service(&h, Duration::from_secs(60));
    let shutdown = CancellationToken::new();

    h.queue.enqueue("a", Some(a.clone())).await;
    let task = {
        let svc = svc.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { svc.run(shutdown).await })
    };

    let runner = h.runner.clone();
    wait_until(|| {
        let runner = runner.clone();
        async move { runner.launches().len() == 1 }
    })
    .await;

    h.queue.enqueue("b", Some(b.clone())).await;
    wait_until(|| {
        let runner = runner.clone();
        async move { runner.launches().len() == 2 }
    })
    .await;

    shutdown.cancel();
    let summary = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("service should stop")
        .unwrap();

    assert!(summary.runs >= 2);
    assert_eq!(summary.errors, 0);
    assert_eq!(h.runner.launched_files(), vec![a, b]);
    assert!(h.queue.is_empty().await);
}

#[tokio::test]
async fn test_service_stops_promptly_when_idle() {
    let h = Harness::new(HOST, ScriptedRunner::new());
    let svc = service(&h, Duration::from_secs(60));
    let shutdown = CancellationToken::new();

    let task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { svc.run(shutdown).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown.cancel();

    let summary = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("service should stop")
        .unwrap();

    assert_eq!(summary.runs, 1);
    assert_eq!(summary.last_outcome, Some(RunOutcome::Done));
}

#[tokio::test]
async fn test_service_does_not_run_after_early_cancel() {
    let h = Harness::new(HOST, ScriptedRunner::new());
    let svc = service(&h, Duration::from_secs(60));
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let summary = svc.run(shutdown).await;

    assert_eq!(summary.runs, 0);
    assert!(summary.last_outcome.is_none());
    assert!(h.runner.launches().is_empty());
}

#[tokio::test]
async fn test_service_exits_on_invalid_destination() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_file(dir.path(), "a.jpg", 1);
    let h = Harness::new("", ScriptedRunner::new());
    h.queue.enqueue("a", Some(a)).await;
    let svc = service(&h, Duration::from_secs(60));

    let summary = tokio::time::timeout(Duration::from_secs(5), svc.run(CancellationToken::new()))
        .await
        .expect("service should give up");

    assert_eq!(summary.runs, 1);
    assert_eq!(summary.last_outcome, Some(RunOutcome::InvalidDestination));
    assert_eq!(h.queue.len().await, 1);
}

#[tokio::test]
async fn test_service_retries_after_abort() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_file(dir.path(), "a.jpg", 1);
    let h = Harness::new(HOST, ScriptedRunner::with_script([Step::Exit(1)]));
    h.queue.enqueue("a", Some(a.clone())).await;
    let svc = service(&h, Duration::from_millis(20));
    let shutdown = CancellationToken::new();

    let task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { svc.run(shutdown).await })
    };

    let queue = h.queue.clone();
    wait_until(|| {
        let queue = queue.clone();
        async move { queue.is_empty().await }
    })
    .await;
    shutdown.cancel();

    let summary = task.await.unwrap();
    assert!(summary.runs >= 2);
    assert_eq!(h.runner.launched_files(), vec![a.clone(), a]);
}

#[tokio::test]
async fn test_service_counts_launch_errors_and_retries() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_file(dir.path(), "a.jpg", 1);
    let h = Harness::new(HOST, ScriptedRunner::with_script([Step::LaunchFails]));
    h.queue.enqueue("a", Some(a)).await;
    let svc = service(&h, Duration::from_millis(20));
    let shutdown = CancellationToken::new();

    let task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { svc.run(shutdown).await })
    };

    let queue = h.queue.clone();
    wait_until(|| {
        let queue = queue.clone();
        async move { queue.is_empty().await }
    })
    .await;
    shutdown.cancel();

    let summary = task.await.unwrap();
    assert_eq!(summary.errors, 1);
    assert_eq!(h.runner.launches().len(), 2);
}

#[tokio::test]
async fn test_service_stays_idle_after_draining_the_queue() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_file(dir.path(), "a.jpg", 1);
    let h = Harness::new(HOST, ScriptedRunner::new());
    let svc = service(&h, Duration::from_secs(60));
    let shutdown = CancellationToken::new();

    // The wake-up from this enqueue is still pending when the first run ends
    h.queue.enqueue("a", Some(a.clone())).await;
    let task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { svc.run(shutdown).await })
    };

    let queue = h.queue.clone();
    wait_until(|| {
        let queue = queue.clone();
        async move { queue.is_empty().await }
    })
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();

    let summary = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("service should stop")
        .unwrap();

    assert_eq!(summary.runs, 1);
    assert_eq!(summary.last_outcome, Some(RunOutcome::Done));
    assert!(!summary.has_failures());
    let done_lines = h
        .status
        .texts()
        .into_iter()
        .filter(|t| t == "Queue empty; done.")
        .count();
    assert_eq!(done_lines, 1);
    assert_eq!(h.runner.launched_files(), vec![a]);
}

#[test]
fn test_summary_failures() {
    let aborted = RunOutcome::Aborted {
        entry: QueueEntryId::new(),
        path: "/tmp/a.jpg".into(),
        exit: ProcessExit::from_code(1),
    };
    let summary = |errors, last_outcome| ServiceSummary {
        runs: 1,
        errors,
        last_outcome,
    };

    assert!(summary(0, Some(aborted)).has_failures());
    assert!(summary(0, Some(RunOutcome::InvalidDestination)).has_failures());
    assert!(summary(1, Some(RunOutcome::Done)).has_failures());
    assert!(!summary(0, Some(RunOutcome::Done)).has_failures());
    assert!(!summary(0, Some(RunOutcome::Paused)).has_failures());
    assert!(!summary(0, None).has_failures());
}
