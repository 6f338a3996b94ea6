//! CLI subcommands and the helpers they share

pub mod config;
pub mod upload;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use putqueue_core::config::Config;
use putqueue_worker::{InMemoryUploadQueue, TokioProcessRunner, UploadWorker, WorkerSettings};

use crate::output::{get_formatter, OutputFormat};

/// Global options every command needs
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub format: OutputFormat,
    pub config_path: PathBuf,
}

impl CommandContext {
    /// Loads the configuration file, falling back to defaults when absent
    pub fn load_config(&self) -> Config {
        Config::load_or_default(&self.config_path)
    }

    /// Loads the configuration and refuses to continue if it is invalid.
    /// A missing file means defaults; an unreadable one is an error.
    pub fn load_valid_config(&self) -> Result<Config> {
        let config = if self.config_path.exists() {
            Config::load(&self.config_path).with_context(|| {
                format!(
                    "Failed to parse configuration {}",
                    self.config_path.display()
                )
            })?
        } else {
            Config::default()
        };
        let errors = config.validate();
        if errors.is_empty() {
            return Ok(config);
        }

        let formatter = get_formatter(self.format);
        for error in &errors {
            formatter.error(&error.to_string());
        }
        anyhow::bail!(
            "Invalid configuration in {} ({} error{})",
            self.config_path.display(),
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        )
    }
}

/// Builds a worker for `config` on top of `queue`
pub fn build_worker(config: &Config, queue: Arc<InMemoryUploadQueue>) -> UploadWorker {
    UploadWorker::new(
        config.destination(),
        config.credentials.clone(),
        WorkerSettings::from_config(config),
        queue,
        Arc::new(TokioProcessRunner::new()),
    )
}

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
pub async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}
