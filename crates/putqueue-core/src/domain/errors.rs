//! Domain error types
//!
//! This module defines error types specific to domain operations
//! (destination parsing, validation) and the errors surfaced by the
//! process ports when the upload program cannot be launched or awaited.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The destination string is not a usable `host[:port]`
    #[error("Invalid host/port: {0}")]
    InvalidHostPort(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors raised while launching or waiting on the upload program
///
/// A non-zero exit status is deliberately not represented here: it is a
/// normal outcome of the upload and is reported through
/// [`RunOutcome::Aborted`](super::upload::RunOutcome::Aborted).
#[derive(Debug, Error)]
pub enum UploadError {
    /// The upload program could not be started
    #[error("Failed to launch {}: {source}", .executable.display())]
    Launch {
        /// Executable that failed to start
        executable: PathBuf,
        /// Underlying OS error (not found, permission denied, ...)
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the upload program to exit failed
    #[error("Failed waiting for upload of {}: {source}", .path.display())]
    Wait {
        /// File that was being uploaded
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    /// Returns `true` for launch failures
    pub fn is_launch(&self) -> bool {
        matches!(self, UploadError::Launch { .. })
    }

    /// Returns `true` for wait failures
    pub fn is_wait(&self) -> bool {
        matches!(self, UploadError::Wait { .. })
    }
}
