//! putqueue CLI - Queue files and push them with the external uploader
//!
//! Provides commands for:
//! - Uploading a set of files once and reporting the outcome
//! - Running the upload service until interrupted
//! - Viewing, validating and creating the configuration file

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use putqueue_core::config::Config;

mod commands;
mod output;

use commands::{
    config::ConfigCommand, upload::UploadCommand, watch::WatchCommand, CommandContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "putqueue",
    version,
    about = "Upload queued files through an external upload program"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload files once and report the outcome
    Upload(UploadCommand),
    /// Keep uploading until interrupted
    Watch(WatchCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Log subscriber for the CLI. Targets stay visible so upload program output
/// (`putqueue::child`) can be told apart from the worker's own events.
fn build_subscriber<W>(
    env_filter: EnvFilter,
    writer: W,
) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(writer)
        .finish()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    // Setup tracing
    let filter = match cli.verbose {
        0 => Config::load_or_default(&config_path).logging.level,
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    build_subscriber(env_filter, std::io::stderr).init();

    let ctx = CommandContext {
        format: OutputFormat::from_flag(cli.json),
        config_path,
    };

    match cli.command {
        Commands::Upload(cmd) => cmd.execute(&ctx).await,
        Commands::Watch(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
    }
}
