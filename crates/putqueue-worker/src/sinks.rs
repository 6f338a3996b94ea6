//! Tracing-backed status and log sinks
//!
//! Default adapters for [`IStatusSink`] and [`ILogSink`] used by the CLI.
//! Embedding applications with a UI provide their own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tracing::{debug, info};

use putqueue_core::domain::{CounterSnapshot, StreamKind};
use putqueue_core::ports::{ILogSink, IStatusSink};

/// Status sink that logs every update and remembers the latest values
#[derive(Debug, Default)]
pub struct TracingStatusSink {
    status: Mutex<Option<String>>,
    in_flight_bytes: AtomicU64,
    in_flight_blobs: AtomicU64,
}

impl TracingStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last status text received, if any
    pub fn last_status(&self) -> Option<String> {
        self.status.lock().ok().and_then(|s| s.clone())
    }

    pub fn counters(&self) -> CounterSnapshot {
        CounterSnapshot {
            in_flight_bytes: self.in_flight_bytes.load(Ordering::Acquire),
            in_flight_blobs: self.in_flight_blobs.load(Ordering::Acquire),
        }
    }
}

impl IStatusSink for TracingStatusSink {
    fn set_status_text(&self, text: &str) {
        info!(status = %text, "Upload status");
        if let Ok(mut status) = self.status.lock() {
            *status = Some(text.to_string());
        }
    }

    fn set_in_flight_bytes(&self, bytes: u64) {
        debug!(bytes, "In-flight bytes");
        self.in_flight_bytes.store(bytes, Ordering::Release);
    }

    fn set_in_flight_blobs(&self, blobs: u64) {
        debug!(blobs, "In-flight blobs");
        self.in_flight_blobs.store(blobs, Ordering::Release);
    }
}

/// Log sink forwarding child output to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl TracingLogSink {
    pub fn new() -> Self {
        Self
    }
}

impl ILogSink for TracingLogSink {
    fn log_line(&self, stream: StreamKind, line: &str) {
        debug!(target: "putqueue::child", stream = %stream, "{}", line);
    }
}
