//! Upload outcomes and status lines
//!
//! Types describing what happened to one upload program invocation and to a
//! whole worker run, plus the human-readable status strings pushed to the
//! status sink after every transition.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::newtypes::{HostPort, QueueEntryId};

/// Which output stream of the upload program a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exit status of the upload program
///
/// `code` is `None` when the child was terminated by a signal. Only an exit
/// code of exactly 0 counts as success; no partial-success codes exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessExit {
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Exit caused by a signal rather than a normal return
    pub fn signaled() -> Self {
        Self { code: None }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ProcessExit {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// How a worker run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The queue owner reported an empty queue
    Done,
    /// A stop was requested and honoured at a safe point
    Paused,
    /// The upload program exited non-zero; the failed entry and every entry
    /// after it remain queued
    Aborted {
        entry: QueueEntryId,
        path: PathBuf,
        exit: ProcessExit,
    },
    /// The destination was invalid; nothing was launched
    InvalidDestination,
}

impl RunOutcome {
    /// Whether the run left the queue fully drained
    pub fn is_done(&self) -> bool {
        matches!(self, RunOutcome::Done)
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RunOutcome::Aborted { .. } | RunOutcome::InvalidDestination
        )
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Done => f.write_str("done"),
            RunOutcome::Paused => f.write_str("paused"),
            RunOutcome::Aborted { path, exit, .. } => {
                write!(f, "aborted at {} ({exit})", path.display())
            }
            RunOutcome::InvalidDestination => f.write_str("invalid destination"),
        }
    }
}

/// Status lines emitted by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Running(HostPort),
    Uploading,
    Uploaded(PathBuf),
    Failed { path: PathBuf, exit: ProcessExit },
    PauseRequested,
    QueueEmpty,
    InvalidDestination(String),
}

impl UploadStatus {
    pub fn uploaded(path: &Path) -> Self {
        UploadStatus::Uploaded(path.to_path_buf())
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Running(hp) => write!(f, "Running uploader for {hp}"),
            UploadStatus::Uploading => f.write_str("Uploading..."),
            UploadStatus::Uploaded(path) => write!(f, "Uploaded {}", path.display()),
            UploadStatus::Failed { path, exit } => {
                write!(f, "Upload of {} failed ({exit})", path.display())
            }
            UploadStatus::PauseRequested => f.write_str("Upload pause requested; ending upload."),
            UploadStatus::QueueEmpty => f.write_str("Queue empty; done."),
            UploadStatus::InvalidDestination(raw) => {
                write!(f, "Invalid destination {raw:?}; not uploading.")
            }
        }
    }
}
