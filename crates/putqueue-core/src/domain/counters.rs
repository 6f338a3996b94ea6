//! In-flight counters and the cooperative stop flag
//!
//! Both types are shared between the worker task and observers on other
//! threads. The worker is the only writer of the counters; readers treat
//! values as eventually consistent and take no lock.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ============================================================================
// AggregateCounters
// ============================================================================

/// Point-in-time copy of the in-flight counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub in_flight_bytes: u64,
    pub in_flight_blobs: u64,
}

impl CounterSnapshot {
    pub fn is_zero(&self) -> bool {
        self.in_flight_bytes == 0 && self.in_flight_blobs == 0
    }
}

/// Byte and blob counts for the work currently being transferred
#[derive(Debug, Default)]
pub struct AggregateCounters {
    in_flight_bytes: AtomicU64,
    in_flight_blobs: AtomicU64,
}

impl AggregateCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_in_flight_bytes(&self, bytes: u64) {
        self.in_flight_bytes.store(bytes, Ordering::Release);
    }

    pub fn set_in_flight_blobs(&self, blobs: u64) {
        self.in_flight_blobs.store(blobs, Ordering::Release);
    }

    /// Zeroes both counters
    pub fn reset(&self) {
        self.set_in_flight_bytes(0);
        self.set_in_flight_blobs(0);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            in_flight_bytes: self.in_flight_bytes.load(Ordering::Acquire),
            in_flight_blobs: self.in_flight_blobs.load(Ordering::Acquire),
        }
    }
}

// ============================================================================
// RunState / StopHandle
// ============================================================================

/// Cancellation state of one upload worker
///
/// Holds a single `stop_requested` flag. The worker reads it at safe points;
/// any thread may set it through a [`StopHandle`].
#[derive(Debug, Default)]
pub struct RunState {
    stop_requested: Arc<AtomicBool>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a cloneable handle that can request a stop from anywhere
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.stop_requested),
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Clears a previous stop request so the worker can run again
    pub fn clear(&self) {
        self.stop_requested.store(false, Ordering::Release);
    }
}

/// Handle used to request a cooperative stop of a worker
///
/// Requesting a stop only sets a flag. It never interrupts an upload that is
/// already running.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Requests a stop. Calling this more than once has no further effect.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
