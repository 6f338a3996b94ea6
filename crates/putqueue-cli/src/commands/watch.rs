//! Watch command - run the upload service until interrupted
//!
//! Enqueues any FILE arguments, then keeps the worker running: every time
//! something new is queued the service starts another run. With `--stdin`,
//! newline-separated paths read from standard input are queued as they
//! arrive. SIGINT/SIGTERM stop the service once the current upload finishes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use putqueue_core::ports::IUploadQueue;
use putqueue_worker::{InMemoryUploadQueue, ServiceSummary, UploadService};

use super::{build_worker, shutdown_signal, CommandContext};
use crate::output::get_formatter;

/// Keep uploading until interrupted
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Files to queue before starting
    pub files: Vec<PathBuf>,

    /// Also queue paths read line by line from standard input
    #[arg(long)]
    pub stdin: bool,
}

impl WatchCommand {
    /// Execute the watch command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let config = ctx.load_valid_config()?;

        let queue = Arc::new(InMemoryUploadQueue::new());
        for file in &self.files {
            queue.enqueue_path(file).await;
        }

        let worker = Arc::new(build_worker(&config, queue.clone()));
        let service = UploadService::new(worker, queue.clone(), config.uploader.retry_delay());

        let shutdown = CancellationToken::new();
        let signal_task = tokio::spawn(shutdown_signal(shutdown.clone()));

        let stdin_task = if self.stdin {
            let queue = queue.clone();
            let shutdown = shutdown.clone();
            Some(tokio::spawn(async move {
                let lines = spawn_stdin_reader();
                tokio::select! {
                    queued = enqueue_lines(lines, &queue) => {
                        info!(queued, "Standard input closed");
                    }
                    _ = shutdown.cancelled() => {}
                }
            }))
        } else {
            None
        };

        formatter.success(&format!(
            "Uploading to {} (Ctrl+C to stop)",
            config.destination()
        ));

        let summary = service.run(shutdown.clone()).await;

        shutdown.cancel();
        signal_task.abort();
        if let Some(task) = stdin_task {
            task.abort();
        }

        let remaining = queue.len().await;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "runs": summary.runs,
                "errors": summary.errors,
                "last_result": summary.last_outcome,
                "remaining": remaining,
            }));
        } else {
            formatter.success(&format!(
                "Stopped after {} run{}",
                summary.runs,
                if summary.runs == 1 { "" } else { "s" }
            ));
            if let Some(outcome) = &summary.last_outcome {
                formatter.info(&format!("Last run: {outcome}"));
            }
            if summary.errors > 0 {
                formatter.warn(&format!("{} run(s) failed to launch or wait", summary.errors));
            }
            if remaining > 0 {
                formatter.info(&format!("{remaining} file(s) still queued"));
            }
        }

        check_summary(&summary)
    }
}

/// Turns a failed service lifetime into a non-zero exit; stopping on
/// Ctrl+C with nothing failed is a clean exit
fn check_summary(summary: &ServiceSummary) -> Result<()> {
    if !summary.has_failures() {
        return Ok(());
    }
    match &summary.last_outcome {
        Some(outcome) if outcome.is_failure() => anyhow::bail!("Upload {}", outcome),
        _ => anyhow::bail!(
            "{} upload run{} failed to launch or wait",
            summary.errors,
            if summary.errors == 1 { "" } else { "s" }
        ),
    }
}

/// Reads standard input on a plain thread so a pending read never holds up
/// runtime shutdown
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        use std::io::BufRead;
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed reading standard input");
                    break;
                }
            }
        }
    });
    rx
}

/// Queues one path per non-empty line until the sender goes away
async fn enqueue_lines(
    mut lines: mpsc::UnboundedReceiver<String>,
    queue: &InMemoryUploadQueue,
) -> usize {
    let mut queued = 0;
    while let Some(line) = lines.recv().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!(path = %line, "Queueing path from stdin");
        queue.enqueue_path(&PathBuf::from(line)).await;
        queued += 1;
    }
    queued
}
