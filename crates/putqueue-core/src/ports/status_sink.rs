//! Status sink port (driven/secondary port)
//!
//! Receives the short human-readable status line emitted after every worker
//! transition, plus the in-flight counters.
//!
//! ## Design Notes
//!
//! - Calls are fire-and-forget; no acknowledgment is expected.
//! - Implementations are called from the worker task and must return quickly.

/// Port trait for status reporting towards a UI or caller
pub trait IStatusSink: Send + Sync {
    /// Replaces the current status text
    fn set_status_text(&self, text: &str);

    /// Reports the number of bytes currently being transferred
    fn set_in_flight_bytes(&self, bytes: u64);

    /// Reports the number of blobs/files currently being transferred
    fn set_in_flight_blobs(&self, blobs: u64);
}
