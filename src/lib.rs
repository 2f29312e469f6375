//! # kaasctl Library
//!
//! Core library functionality for the kaasctl tool: the classified API
//! transport, capability resolution, and cluster name resolution.

use clap::{Args, Parser};

pub mod capabilities;
pub mod client;
pub mod cluster_resolver;
pub mod commands;
pub mod config;
pub mod constants;

/// Command-line client for a managed Kubernetes control-plane API
#[derive(Parser)]
#[command(
    name = "kaasctl",
    version,
    about = "Command-line client for a managed Kubernetes control-plane API",
    long_about = "kaasctl talks to a managed Kubernetes control-plane API.\n\nClusters can be referenced by name or by ID; optional features are offered\nonly where the installation's provider and the cluster's release support them."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub cmd: Option<commands::Commands>,
}

/// Flags shared by all commands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// API endpoint to use, as a configured name or a URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
    /// Bearer token to use instead of the configured credentials
    #[arg(long, global = true)]
    pub auth_token: Option<String>,
    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}
