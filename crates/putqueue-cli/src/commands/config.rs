//! Config command - View, validate and create the putqueue configuration
//!
//! Provides the `putqueue config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON) with the password masked
//! 2. Validates the configuration file and reports errors
//! 3. Writes a default configuration file to start from

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use putqueue_core::config::Config;

use super::CommandContext;
use crate::output::get_formatter;

/// Shown instead of a configured password
const REDACTED: &str = "********";

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(ctx),
            ConfigCommand::Validate => execute_validate(ctx),
            ConfigCommand::Init { force } => execute_init(ctx, *force),
        }
    }
}

/// Configuration as a JSON value with the password replaced
fn redacted(config: &Config) -> Result<serde_json::Value> {
    let mut value =
        serde_json::to_value(config).context("Failed to serialize configuration to JSON")?;
    if let Some(password) = value.pointer_mut("/credentials/password") {
        if password.as_str().is_some_and(|p| !p.is_empty()) {
            *password = serde_json::Value::String(REDACTED.to_string());
        }
    }
    Ok(value)
}

fn execute_show(ctx: &CommandContext) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    let config = ctx.load_config();

    info!(config_path = %ctx.config_path.display(), "Showing configuration");

    let value = redacted(&config)?;
    if ctx.format.is_json() {
        formatter.print_json(&value);
    } else {
        formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
        formatter.info("");

        let yaml =
            serde_yaml::to_string(&value).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }
    }

    Ok(())
}

fn execute_validate(ctx: &CommandContext) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    let config_path = &ctx.config_path;

    // Load explicitly: a missing or unparsable file is a finding here
    let config = match Config::load(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            let message = if config_path.exists() {
                format!("Failed to parse configuration: {e}")
            } else {
                "Configuration file not found".to_string()
            };
            if ctx.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "errors": [message],
                }));
            } else {
                formatter.error(&message);
                formatter.info(&format!("File: {}", config_path.display()));
                formatter.info("Run 'putqueue config init' to create one.");
            }
            anyhow::bail!("Configuration is not usable");
        }
    };

    info!(config_path = %config_path.display(), "Validating configuration");

    let errors = config.validate();

    if ctx.format.is_json() {
        let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {}", config_path.display()));
    } else {
        formatter.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        formatter.info(&format!("File: {}", config_path.display()));
        formatter.info("");
        for error in &errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Configuration is invalid")
    }
}

fn execute_init(ctx: &CommandContext, force: bool) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    let config_path = &ctx.config_path;

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    Config::default()
        .save(config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    info!(config_path = %config_path.display(), "Wrote default configuration");

    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({
            "success": true,
            "config_path": config_path.display().to_string(),
        }));
    } else {
        formatter.success(&format!("Wrote {}", config_path.display()));
        formatter.info("Set credentials.username and credentials.password before uploading.");
    }

    Ok(())
}
