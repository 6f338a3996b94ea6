//! Configuration module for putqueue.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{Credentials, HostPort};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for putqueue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub destination: DestinationConfig,
    pub credentials: Credentials,
    pub uploader: UploaderConfig,
    pub logging: LoggingConfig,
}

/// Where uploads go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// `host[:port]` of the blob server.
    pub host_port: String,
}

/// Upload program and worker behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    /// Private storage root; a relative `executable` is resolved against it.
    pub storage_root: PathBuf,
    /// Upload program, relative to `storage_root` or absolute.
    pub executable: PathBuf,
    /// Also honour stop requests between files, not only between passes.
    pub stop_between_files: bool,
    /// Milliseconds to let output drainers flush after the child exits.
    pub drain_grace_ms: u64,
    /// Seconds the watch service waits before retrying after a failed run.
    pub retry_delay_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the configuration as YAML to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/putqueue/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("putqueue")
            .join("config.yaml")
    }

    /// Parsed upload destination. May be invalid; see [`HostPort::is_valid`].
    pub fn destination(&self) -> HostPort {
        HostPort::new(self.destination.host_port.clone())
    }
}

impl UploaderConfig {
    /// Absolute path of the upload program.
    pub fn executable_path(&self) -> PathBuf {
        if self.executable.is_absolute() {
            self.executable.clone()
        } else {
            self.storage_root.join(&self.executable)
        }
    }

    pub fn drain_grace(&self) -> Duration {
        Duration::from_millis(self.drain_grace_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            host_port: "localhost:3179".to_string(),
        }
    }
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            storage_root: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("putqueue"),
            executable: PathBuf::from("camput.bin"),
            stop_between_files: false,
            drain_grace_ms: 2000,
            retry_delay_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"uploader.drain_grace_ms"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- destination ---
        if !self.destination().is_valid() {
            errors.push(ValidationError {
                field: "destination.host_port".into(),
                message: format!(
                    "'{}' is not a valid host[:port]",
                    self.destination.host_port
                ),
            });
        }

        // --- credentials ---
        if self.credentials.username.is_empty() {
            errors.push(ValidationError {
                field: "credentials.username".into(),
                message: "must not be empty".into(),
            });
        }
        if self.credentials.username.contains(':') {
            errors.push(ValidationError {
                field: "credentials.username".into(),
                message: "must not contain ':'".into(),
            });
        }

        // --- uploader ---
        if self.uploader.executable.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "uploader.executable".into(),
                message: "must not be empty".into(),
            });
        }
        if self.uploader.drain_grace_ms == 0 {
            errors.push(ValidationError {
                field: "uploader.drain_grace_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.uploader.retry_delay_secs == 0 {
            errors.push(ValidationError {
                field: "uploader.retry_delay_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Config`].
///
/// Starts from [`Config::default`] and lets callers override individual fields.
///
/// ```rust
/// use putqueue_core::config::ConfigBuilder;
///
/// let cfg = ConfigBuilder::new()
///     .host_port("blobs.example.com:3179")
///     .credentials("alice", "hunter2")
///     .build();
/// assert_eq!(cfg.destination.host_port, "blobs.example.com:3179");
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder pre-filled with default values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- destination ---

    pub fn host_port(mut self, host_port: impl Into<String>) -> Self {
        self.config.destination.host_port = host_port.into();
        self
    }

    // --- credentials ---

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Credentials::new(username, password);
        self
    }

    // --- uploader ---

    pub fn storage_root(mut self, root: PathBuf) -> Self {
        self.config.uploader.storage_root = root;
        self
    }

    pub fn executable(mut self, executable: PathBuf) -> Self {
        self.config.uploader.executable = executable;
        self
    }

    pub fn stop_between_files(mut self, enabled: bool) -> Self {
        self.config.uploader.stop_between_files = enabled;
        self
    }

    pub fn drain_grace_ms(mut self, ms: u64) -> Self {
        self.config.uploader.drain_grace_ms = ms;
        self
    }

    pub fn retry_delay_secs(mut self, secs: u64) -> Self {
        self.config.uploader.retry_delay_secs = secs;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Consume the builder and return the [`Config`] without validation.
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, validate, and return the [`Config`] or errors.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
