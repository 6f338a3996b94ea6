//! Process runner port (driven/secondary port)
//!
//! This module defines how the worker launches the external upload program
//! for one file and observes it until exit.
//!
//! ## Invocation Contract
//!
//! ```text
//! <executable> --server=<url prefix> file -vivify <absolute file path>
//! env: CAMLI_AUTH=userpass:<username>:<password>
//! ```
//!
//! The upload mode is fixed to "upload a single file, vivifying any partial
//! prior upload of the same content". Credentials travel only through the
//! environment so they never appear in the process list.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::domain::newtypes::AUTH_ENV_VAR;
use crate::domain::{Credentials, HostPort, ProcessExit, UploadError};

/// Readable output stream of a running upload program
pub type ChildStream = Box<dyn AsyncRead + Send + Unpin>;

/// Everything needed to launch the upload program for one file
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    executable: PathBuf,
    server_url: String,
    file_path: PathBuf,
    credentials: Credentials,
}

impl LaunchRequest {
    pub fn new(
        executable: impl Into<PathBuf>,
        destination: &HostPort,
        file_path: impl Into<PathBuf>,
        credentials: Credentials,
    ) -> Self {
        Self {
            executable: executable.into(),
            server_url: destination.url_prefix(),
            file_path: file_path.into(),
            credentials,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Command-line arguments for the upload program
    ///
    /// Never contains credentials.
    pub fn args(&self) -> Vec<String> {
        vec![
            format!("--server={}", self.server_url),
            "file".to_string(),
            "-vivify".to_string(),
            self.file_path.display().to_string(),
        ]
    }

    /// The single environment variable added for the child
    pub fn auth_env(&self) -> (&'static str, String) {
        (AUTH_ENV_VAR, self.credentials.auth_env_value())
    }
}

/// Port trait for launching the upload program
///
/// A single best-effort launch primitive: no retries live behind this trait.
#[async_trait]
pub trait IProcessRunner: Send + Sync {
    /// Starts the upload program described by `request`
    ///
    /// # Errors
    /// [`UploadError::Launch`] when the executable is missing, not
    /// executable, or the environment could not be set up.
    async fn start(&self, request: &LaunchRequest) -> Result<Box<dyn IUploadProcess>, UploadError>;
}

/// Handle to one running upload program
#[async_trait]
pub trait IUploadProcess: Send {
    /// Takes the child's stdout; `None` after the first call
    fn take_stdout(&mut self) -> Option<ChildStream>;

    /// Takes the child's stderr; `None` after the first call
    fn take_stderr(&mut self) -> Option<ChildStream>;

    /// Waits for the child to exit
    ///
    /// # Errors
    /// [`UploadError::Wait`] when waiting fails or is interrupted.
    async fn wait_for_exit(&mut self) -> Result<ProcessExit, UploadError>;
}
