//! The `repos` command: show the configured container URLs.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::{output, Cli};

/// Runs the `repos` command.
pub fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("could not load configuration")?;

    output::print_urls(
        &config.container_urls.options,
        &config.container_urls.default,
        cli.format,
    )
}
