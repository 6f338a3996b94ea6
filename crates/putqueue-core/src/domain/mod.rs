//! Domain entities and value types
//!
//! This module contains the core domain types for putqueue:
//! - Newtypes for entry identifiers, destinations and credentials
//! - Queue entries
//! - In-flight counters and the stop flag shared with the worker
//! - Upload outcomes and status lines
//! - Domain-specific error types

pub mod counters;
pub mod errors;
pub mod newtypes;
pub mod queued_file;
pub mod upload;

// Re-export commonly used types
pub use counters::{AggregateCounters, CounterSnapshot, RunState, StopHandle};
pub use errors::{DomainError, UploadError};
pub use newtypes::{Credentials, HostPort, QueueEntryId};
pub use queued_file::QueuedFile;
pub use upload::{ProcessExit, RunOutcome, StreamKind, UploadStatus};
