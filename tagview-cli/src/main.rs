// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! tagview CLI - curated image tag listing for OCI registries.
//!
//! # Examples
//!
//! ```bash
//! # Curated tags for a container URL
//! tagview tags ghcr.io/ublue-os/bazzite:testing
//!
//! # Raw registry order, no curation
//! tagview tags ghcr.io/ublue-os/bazzite --raw
//!
//! # JSON output with a custom limit
//! tagview tags ghcr.io/astrovm/amyos:latest -n 10 --format json
//!
//! # Configured container URLs
//! tagview repos
//! ```

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{repos, tags};

// ============================================================================
// CLI Definition
// ============================================================================

/// tagview - curated image tag listing for OCI registries.
#[derive(Parser)]
#[command(name = "tagview")]
#[command(about = "Curated image tag listing for OCI registries")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Configuration file path.
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List curated tags for a container URL.
    #[command(visible_alias = "t")]
    Tags(tags::TagsArgs),

    /// Show the configured container URLs.
    Repos,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text, one tag per line.
    Text,
    /// JSON object.
    Json,
}

// ============================================================================
// Logging
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("tagview_core=debug,tagview_fetch=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Tags(args) => tags::run(args, &cli).await,
        Commands::Repos => repos::run(&cli),
    }
}
