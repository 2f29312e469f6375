//! # kaasctl
//!
//! Command-line client for a managed Kubernetes control-plane API.
//!
//! ## Quick Start
//!
//! ```bash
//! # Check that the API answers
//! kaasctl --endpoint https://api.example.com ping
//!
//! # Inspect a cluster by name or ID
//! kaasctl show cluster production
//!
//! # Turn on highly available masters
//! kaasctl update cluster production --master-ha
//! ```
//!
//! ## Configuration
//!
//! Endpoints and defaults live in `~/.config/kaasctl/config.yaml`, or the file
//! named by `KAASCTL_CONFIG_PATH`. Debug logs are enabled with `--verbose` or
//! `RUST_LOG`.

use clap::Parser;
use kaasctl::{commands, Cli};
use tracing_subscriber::EnvFilter;

/// Main entry point for kaasctl
///
/// Parses command-line arguments and delegates to the appropriate command handler.
/// Failures are printed as a headline and an optional explanation, and the
/// process exits with status 1.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let Some(cmd) = cli.cmd else {
        eprintln!("No command provided. Use --help to see available commands.");
        std::process::exit(1);
    };

    if let Err(err) = commands::run(cmd, &cli.global).await {
        let (headline, subtext) = commands::errors::describe(&err);
        eprintln!("Error: {headline}");
        if !subtext.is_empty() {
            eprintln!("{subtext}");
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
