//! Putqueue Worker - Background upload of queued files
//!
//! Provides:
//! - A cooperative, stoppable upload worker draining the queue file by file
//! - Child process launch with credentials passed through the environment
//! - Line-by-line forwarding of the upload program's output
//! - A service loop that re-runs the worker whenever the queue changes
//!
//! ## Modules
//!
//! - [`worker`] - Upload state machine (validate, snapshot, per-file upload)
//! - [`process`] - Tokio-backed `IProcessRunner` adapter
//! - [`drain`] - Background readers for child stdout/stderr
//! - [`queue`] - In-memory queue owner with change notification
//! - [`service`] - Long-running supervisor with cancellation
//! - [`sinks`] - Tracing-backed status and log sinks

pub mod drain;
pub mod process;
pub mod queue;
pub mod service;
pub mod sinks;
pub mod worker;

pub use process::TokioProcessRunner;
pub use queue::InMemoryUploadQueue;
pub use service::{ServiceSummary, UploadService};
pub use sinks::{TracingLogSink, TracingStatusSink};
pub use worker::{UploadWorker, WorkerSettings};
