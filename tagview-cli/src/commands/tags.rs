//! The `tags` command: list curated tags for a container URL.

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use tracing::debug;

use tagview_core::ImageReference;
use tagview_fetch::{CurlTransport, RegistryClient};

use crate::config::Config;
use crate::{output, Cli};

/// Arguments for the `tags` command.
#[derive(Debug, Args)]
pub struct TagsArgs {
    /// Container URL, e.g. `ghcr.io/ublue-os/bazzite:testing`.
    pub url: String,

    /// Maximum number of tags to show (defaults to the configured limit).
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Skip curation and print the raw tag list as the registry returns it.
    #[arg(long)]
    pub raw: bool,
}

/// Runs the `tags` command.
pub async fn run(args: &TagsArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    let reference = ImageReference::parse(&args.url)
        .with_context(|| format!("could not parse '{}'", args.url))?;
    debug!(
        repository = %reference.repository,
        context = ?reference.context,
        "Resolved target"
    );

    let client = RegistryClient::with_transport(
        reference.repository.clone(),
        config.settings.registry.clone(),
        config.settings.token_cache_path.clone(),
        Arc::new(CurlTransport::new()),
    );

    let tags = if args.raw {
        client.list_all_tags().await
    } else {
        let policy = config.policy_for(&reference.repository);
        let limit = args.limit.unwrap_or(config.settings.max_tags_display);
        client
            .list_tags_filtered(&policy, reference.context, limit)
            .await
    }
    .with_context(|| format!("could not list tags for {}", reference.repository))?;

    output::print_tags(
        &args.url,
        &reference.repository,
        &tags,
        cli.format,
        cli.pretty,
    )
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from(path).context("could not load configuration"),
        None => Config::load().context("could not load configuration"),
    }
}
