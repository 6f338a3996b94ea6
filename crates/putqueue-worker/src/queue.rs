//! In-memory upload queue
//!
//! [`InMemoryUploadQueue`] is the queue owner used by the CLI. It keeps the
//! pending entries behind a `tokio::sync::Mutex` and wakes a waiting service
//! through a `Notify` whenever something is enqueued, so an idle service
//! sleeps instead of re-polling.
//!
//! ## Flow
//!
//! ```text
//! enqueue() ──→ Vec<QueuedFile> ──snapshot()──→ UploadWorker
//!     │                ▲                             │
//!     └─→ Notify       └──────── remove(id) ─────────┘
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use putqueue_core::domain::{QueueEntryId, QueuedFile};
use putqueue_core::ports::IUploadQueue;

/// Mutex-guarded ordered queue with change notification
#[derive(Debug, Default)]
pub struct InMemoryUploadQueue {
    entries: Mutex<Vec<QueuedFile>>,
    changed: Notify,
}

impl InMemoryUploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an already-built entry
    pub async fn push(&self, file: QueuedFile) -> QueueEntryId {
        let id = file.id();
        debug!(entry = %id, file = %file, "Enqueued file");
        self.entries.lock().await.push(file);
        self.changed.notify_one();
        id
    }

    /// Appends an entry for `source`, resolved to `disk_path` when known
    pub async fn enqueue(
        &self,
        source: impl Into<String>,
        disk_path: Option<PathBuf>,
    ) -> QueueEntryId {
        self.push(QueuedFile::new(source, disk_path)).await
    }

    /// Resolves `path` to an absolute regular file and enqueues it
    ///
    /// A path that cannot be resolved is still enqueued, without a disk
    /// path, so the worker drops it the way it drops any unresolvable entry.
    pub async fn enqueue_path(&self, path: &Path) -> QueueEntryId {
        let resolved = resolve_disk_path(path).await;
        self.enqueue(path.display().to_string(), resolved).await
    }

    /// Resolves once something is enqueued after the previous wake-up
    ///
    /// Backed by `Notify::notify_one`, so an enqueue that happens while no
    /// one is waiting is remembered for the next caller. Intended for a
    /// single waiting consumer.
    pub async fn changed(&self) {
        self.changed.notified().await;
    }
}

#[async_trait]
impl IUploadQueue for InMemoryUploadQueue {
    async fn snapshot(&self) -> Vec<QueuedFile> {
        self.entries.lock().await.clone()
    }

    async fn remove(&self, id: QueueEntryId) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.iter().position(|e| e.id() == id) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

async fn resolve_disk_path(path: &Path) -> Option<PathBuf> {
    let resolved = match tokio::fs::canonicalize(path).await {
        Ok(p) => p,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not resolve file");
            return None;
        }
    };
    match tokio::fs::metadata(&resolved).await {
        Ok(meta) if meta.is_file() => Some(resolved),
        Ok(_) => {
            warn!(path = %resolved.display(), "Not a regular file");
            None
        }
        Err(e) => {
            warn!(path = %resolved.display(), error = %e, "Could not stat file");
            None
        }
    }
}
