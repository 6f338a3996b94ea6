//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! upload worker. Ports are interfaces that the worker depends on, but whose
//! implementations live in adapter code (the in-memory queue, tracing sinks,
//! the tokio process runner) or in the embedding application.
//!
//! ## Ports Overview
//!
//! - [`IUploadQueue`] - The queue owner holding pending files
//! - [`IStatusSink`] - Status text and in-flight counters for a UI
//! - [`ILogSink`] - Destination for the upload program's output lines
//! - [`IProcessRunner`] - Launches the external upload program

pub mod log_sink;
pub mod process_runner;
pub mod status_sink;
pub mod upload_queue;

pub use log_sink::ILogSink;
pub use process_runner::{ChildStream, IProcessRunner, IUploadProcess, LaunchRequest};
pub use status_sink::IStatusSink;
pub use upload_queue::IUploadQueue;
