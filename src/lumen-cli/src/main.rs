//! Lumen CLI - Main entry point.
//!
//! - `generate` streams a generation to the terminal
//! - `format` renders text into sections without any network call
//! - `config` shows the effective configuration

use anyhow::Result;
use clap::Parser;

use lumen_cli::cli::{Cli, dispatch_command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        lumen_cli::cli::LogLevel::Debug
    } else {
        cli.log_level
    };

    // Logs go to stderr so generated text on stdout stays clean.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "warn,lumen_stream={},lumen_cli={}",
            log_level.as_filter_str(),
            log_level.as_filter_str()
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    dispatch_command(cli).await
}
