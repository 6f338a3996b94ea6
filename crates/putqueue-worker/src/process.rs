//! Tokio-backed process runner
//!
//! [`TokioProcessRunner`] implements [`IProcessRunner`] with
//! `tokio::process::Command`. It is a single launch-and-wait primitive: no
//! retries, no output interpretation.
//!
//! The child gets a null stdin and piped stdout/stderr. Its environment is
//! the parent's plus the auth variable from [`LaunchRequest::auth_env`]. The
//! child is never killed by this runner: dropping a handle leaves a running
//! upload to finish on its own.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use putqueue_core::domain::{ProcessExit, UploadError};
use putqueue_core::ports::{ChildStream, IProcessRunner, IUploadProcess, LaunchRequest};

/// Launches the upload program as a tokio child process
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Builds the command for `request` without spawning it
    pub fn command(request: &LaunchRequest) -> Command {
        let (env_name, env_value) = request.auth_env();
        let mut cmd = Command::new(request.executable());
        cmd.args(request.args())
            .env(env_name, env_value)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);
        cmd
    }
}

#[async_trait]
impl IProcessRunner for TokioProcessRunner {
    async fn start(&self, request: &LaunchRequest) -> Result<Box<dyn IUploadProcess>, UploadError> {
        let child = Self::command(request)
            .spawn()
            .map_err(|source| UploadError::Launch {
                executable: request.executable().to_path_buf(),
                source,
            })?;

        info!(
            executable = %request.executable().display(),
            file = %request.file_path().display(),
            server = %request.server_url(),
            pid = ?child.id(),
            "Started upload program"
        );

        Ok(Box::new(TokioUploadProcess {
            child,
            file_path: request.file_path().to_path_buf(),
        }))
    }
}

/// Handle to a running upload program
pub struct TokioUploadProcess {
    child: Child,
    file_path: std::path::PathBuf,
}

#[async_trait]
impl IUploadProcess for TokioUploadProcess {
    fn take_stdout(&mut self) -> Option<ChildStream> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as ChildStream)
    }

    fn take_stderr(&mut self) -> Option<ChildStream> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as ChildStream)
    }

    async fn wait_for_exit(&mut self) -> Result<ProcessExit, UploadError> {
        debug!(file = %self.file_path.display(), "Waiting for upload program");
        let status = self.child.wait().await.map_err(|source| UploadError::Wait {
            path: self.file_path.clone(),
            source,
        })?;
        let exit = ProcessExit::from(status);
        debug!(file = %self.file_path.display(), exit = %exit, "Upload program exited");
        Ok(exit)
    }
}
