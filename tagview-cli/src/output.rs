//! Output formatting for the CLI.

use serde::Serialize;

use crate::OutputFormat;

/// JSON payload for a tag listing.
#[derive(Debug, Serialize)]
struct TagListing<'a> {
    url: &'a str,
    repository: &'a str,
    tags: &'a [String],
}

/// Prints a tag listing in the requested format.
pub fn print_tags(
    url: &str,
    repository: &str,
    tags: &[String],
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            if tags.is_empty() {
                println!("No tags found for {repository}");
            } else {
                for tag in tags {
                    println!("{tag}");
                }
            }
        }
        OutputFormat::Json => {
            let listing = TagListing {
                url,
                repository,
                tags,
            };
            let json = if pretty {
                serde_json::to_string_pretty(&listing)?
            } else {
                serde_json::to_string(&listing)?
            };
            println!("{json}");
        }
    }
    Ok(())
}

/// Prints the configured container URLs.
pub fn print_urls(urls: &[String], default: &str, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for url in urls {
                if url == default {
                    println!("{url} (default)");
                } else {
                    println!("{url}");
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(urls)?);
        }
    }
    Ok(())
}
