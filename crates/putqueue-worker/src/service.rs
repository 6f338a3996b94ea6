//! Upload service - re-runs the worker whenever the queue changes
//!
//! The [`UploadService`] sits between the [`InMemoryUploadQueue`] and the
//! [`UploadWorker`]. A worker run ends once the queue is empty; the service
//! then sleeps until something is enqueued and starts the next run.
//!
//! ## Flow
//!
//! ```text
//! enqueue ──→ Notify ──→ UploadService ──→ UploadWorker::run()
//!                             │
//!                     CancellationToken ──→ StopHandle::stop()
//! ```
//!
//! After an aborted or failed run the service waits for `retry_delay` (or a
//! queue change, whichever comes first) before trying again. Shutdown is
//! cooperative: the token sets the worker's stop flag and the service waits
//! for the current run to reach a safe point.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use putqueue_core::domain::RunOutcome;
use putqueue_core::ports::IUploadQueue;

use crate::queue::InMemoryUploadQueue;
use crate::worker::UploadWorker;

/// Summary of a service lifetime
#[derive(Debug, Clone, Default)]
pub struct ServiceSummary {
    /// Number of worker runs started
    pub runs: u32,
    /// Runs that ended with a launch/wait error
    pub errors: u32,
    /// Outcome of the last run that returned one
    pub last_outcome: Option<RunOutcome>,
}

impl ServiceSummary {
    /// Whether any run errored or the service stopped on a failed run.
    /// A pause from shutdown is not a failure.
    pub fn has_failures(&self) -> bool {
        self.errors > 0 || self.last_outcome.as_ref().is_some_and(RunOutcome::is_failure)
    }
}

/// Supervises repeated worker runs until shutdown
pub struct UploadService {
    worker: Arc<UploadWorker>,
    queue: Arc<InMemoryUploadQueue>,
    retry_delay: Duration,
}

impl UploadService {
    pub fn new(
        worker: Arc<UploadWorker>,
        queue: Arc<InMemoryUploadQueue>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            worker,
            queue,
            retry_delay,
        }
    }

    /// Runs the worker loop until `shutdown` is cancelled or a run ends in a
    /// state that cannot make progress (paused, invalid destination)
    pub async fn run(&self, shutdown: CancellationToken) -> ServiceSummary {
        info!(
            destination = %self.worker.destination(),
            retry_delay_secs = self.retry_delay.as_secs(),
            "Upload service starting"
        );

        let stop = self.worker.stop_handle();
        let stop_token = shutdown.clone();
        let stop_task = tokio::spawn(async move {
            stop_token.cancelled().await;
            stop.stop();
        });

        let mut summary = ServiceSummary::default();

        loop {
            if shutdown.is_cancelled() {
                info!("Shutdown requested");
                break;
            }

            summary.runs += 1;
            let wait_for_retry = match self.worker.run().await {
                Ok(outcome) => {
                    let next = match &outcome {
                        RunOutcome::Done => Some(false),
                        RunOutcome::Aborted { path, exit, .. } => {
                            warn!(
                                file = %path.display(),
                                exit = %exit,
                                "Upload run aborted; will retry"
                            );
                            Some(true)
                        }
                        RunOutcome::Paused | RunOutcome::InvalidDestination => None,
                    };
                    summary.last_outcome = Some(outcome);
                    match next {
                        Some(retry) => retry,
                        None => break,
                    }
                }
                Err(e) => {
                    error!(error = %e, "Upload run failed; will retry");
                    summary.errors += 1;
                    true
                }
            };

            if !self.wait_for_work(&shutdown, wait_for_retry).await {
                info!("Shutdown requested while idle");
                break;
            }
        }

        stop_task.abort();
        info!(runs = summary.runs, errors = summary.errors, "Upload service stopped");
        summary
    }

    /// Waits for the next reason to run; `false` means shut down
    async fn wait_for_work(&self, shutdown: &CancellationToken, retry: bool) -> bool {
        if retry {
            tokio::select! {
                _ = tokio::time::sleep(self.retry_delay) => true,
                _ = self.queue.changed() => true,
                _ = shutdown.cancelled() => false,
            }
        } else {
            // Skip wake-ups left over from files the last run already uploaded
            loop {
                tokio::select! {
                    _ = self.queue.changed() => {
                        if !self.queue.is_empty().await {
                            return true;
                        }
                        debug!("Queue change already handled; still idle");
                    }
                    _ = shutdown.cancelled() => return false,
                }
            }
        }
    }
}
