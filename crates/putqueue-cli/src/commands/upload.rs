//! Upload command - push a set of files once
//!
//! Enqueues every FILE argument, runs the worker until the queue is empty
//! (or the first failure), and reports what happened. Ctrl+C requests a
//! stop that takes effect once the current upload finishes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use putqueue_core::domain::RunOutcome;
use putqueue_core::ports::IUploadQueue;
use putqueue_worker::{InMemoryUploadQueue, TracingStatusSink};

use super::{build_worker, shutdown_signal, CommandContext};
use crate::output::{get_formatter, OutputFormatter};

/// Upload files once
#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Files to upload, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl UploadCommand {
    /// Execute the upload command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let config = ctx.load_valid_config()?;

        let queue = Arc::new(InMemoryUploadQueue::new());
        for file in &self.files {
            queue.enqueue_path(file).await;
        }
        info!(files = self.files.len(), "Queued files for upload");

        let status = Arc::new(TracingStatusSink::new());
        let worker = build_worker(&config, queue.clone()).with_status_sink(status.clone());

        let shutdown = CancellationToken::new();
        let signal_task = tokio::spawn(shutdown_signal(shutdown.clone()));
        let stop = worker.stop_handle();
        let stop_task = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                shutdown.cancelled().await;
                stop.stop();
            })
        };

        let result = worker.run().await;
        signal_task.abort();
        stop_task.abort();

        let remaining = queue.len().await;
        let last_status = status.last_status();

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                if ctx.format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                        "remaining": remaining,
                    }));
                }
                return Err(e.into());
            }
        };

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": outcome.is_done(),
                "result": outcome,
                "remaining": remaining,
                "status": last_status,
            }));
        } else {
            report_human(formatter.as_ref(), &outcome, remaining, last_status.as_deref());
        }

        if outcome.is_done() {
            Ok(())
        } else {
            anyhow::bail!("Upload {}", outcome)
        }
    }
}

fn report_human(
    formatter: &dyn OutputFormatter,
    outcome: &RunOutcome,
    remaining: usize,
    last_status: Option<&str>,
) {
    match outcome {
        RunOutcome::Done => formatter.success("All files uploaded"),
        RunOutcome::Paused => {
            formatter.warn(&format!("Upload paused; {remaining} file(s) still queued"))
        }
        RunOutcome::Aborted { path, exit, .. } => {
            formatter.error(&format!("Upload of {} failed ({exit})", path.display()));
            formatter.info(&format!("{remaining} file(s) not uploaded"));
        }
        RunOutcome::InvalidDestination => formatter.error("Destination host/port is invalid"),
    }
    if let Some(status) = last_status {
        formatter.info(status);
    }
}
