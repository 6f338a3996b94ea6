//! Upload queue port (driven/secondary port)
//!
//! The queue owner produces pending files and holds them until the worker
//! removes them. The worker takes one snapshot per outer pass and removes
//! entries by id as they complete, so entries the owner appends meanwhile
//! never disturb the pass in progress.

use async_trait::async_trait;

use crate::domain::{QueueEntryId, QueuedFile};

/// Port trait for the owner of the pending upload queue
///
/// ## Implementation Notes
///
/// - `snapshot` returns the live entries in queue order. It must reflect
///   removals already performed through `remove`.
/// - `remove` deletes exactly one entry and leaves the relative order of the
///   rest untouched. Removing an unknown id returns `false`.
/// - Implementations must be safe to call from the worker task while other
///   tasks enqueue.
#[async_trait]
pub trait IUploadQueue: Send + Sync {
    /// Returns the current queue contents in order
    async fn snapshot(&self) -> Vec<QueuedFile>;

    /// Removes the entry with the given id
    ///
    /// # Returns
    /// `true` if the entry was present
    async fn remove(&self, id: QueueEntryId) -> bool;

    /// Number of entries currently queued
    async fn len(&self) -> usize;

    /// Whether the queue is empty
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
