//! Queue entry type
//!
//! A [`QueuedFile`] is one pending upload. It carries the opaque reference the
//! file was enqueued under and, when resolution succeeded, the local path the
//! upload program should read.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::QueueEntryId;

/// One pending upload unit
///
/// ## Invariant
///
/// An entry without a resolved disk path can never be uploaded. The worker
/// drops such entries from the queue without launching the upload program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedFile {
    id: QueueEntryId,
    source: String,
    disk_path: Option<PathBuf>,
    enqueued_at: DateTime<Utc>,
}

impl QueuedFile {
    /// Creates a new entry with a fresh id
    pub fn new(source: impl Into<String>, disk_path: Option<PathBuf>) -> Self {
        Self {
            id: QueueEntryId::new(),
            source: source.into(),
            disk_path,
            enqueued_at: Utc::now(),
        }
    }

    /// Creates an entry whose source reference is the path itself
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(path.display().to_string(), Some(path))
    }

    pub fn id(&self) -> QueueEntryId {
        self.id
    }

    /// Opaque origin reference (content URI, original argument, ...)
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Resolved local path, if resolution succeeded
    pub fn disk_path(&self) -> Option<&Path> {
        self.disk_path.as_deref()
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    /// Whether the entry can be handed to the upload program
    pub fn is_uploadable(&self) -> bool {
        self.disk_path.is_some()
    }
}

impl fmt::Display for QueuedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.disk_path {
            Some(path) => write!(f, "{} ({})", self.source, path.display()),
            None => write!(f, "{} (unresolved)", self.source),
        }
    }
}
