//! Paginated tag listing against an OCI registry.
//!
//! [`RegistryClient`] walks the `/v2/{repo}/tags/list` endpoint page by
//! page, following `Link` headers. Each page captures body and headers
//! in a single request, so the next-page URL costs no extra round trip.
//! Pagination is strictly sequential; the only retry is one token
//! refresh per page on 401/403.

use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::OnceLock;
use tracing::{debug, instrument, warn};

use tagview_core::models::{ChannelContext, TagPage};
use tagview_core::policy::RepositoryPolicy;
use tagview_core::TagFilter;

use crate::error::FetchError;
use crate::response::parse_response;
use crate::token::TokenManager;
use crate::transport::{CurlTransport, FetchOptions, Transport};

/// Default registry host.
pub const DEFAULT_REGISTRY: &str = "ghcr.io";

/// Page size hint sent with the first request.
const PAGE_SIZE: u32 = 200;

/// Hard cap on page fetches per listing.
const MAX_PAGES: u32 = 1000;

/// Tag listing response body.
#[derive(Debug, Deserialize)]
struct TagListResponse {
    #[serde(default)]
    tags: Vec<String>,
}

fn link_next_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<\s*([^>]+?)\s*>\s*;\s*rel\s*=\s*["']next["']"#).expect("Invalid regex")
    })
}

/// Extracts the next-page URL from a `Link` header value.
///
/// Tolerates surrounding whitespace and either quote style around
/// `rel="next"`.
pub fn parse_link_header(value: &str) -> Option<String> {
    link_next_re()
        .captures(value)
        .map(|caps| caps[1].to_string())
}

// ============================================================================
// Registry Client
// ============================================================================

/// Client for listing the tags of one repository.
pub struct RegistryClient {
    repository: String,
    registry: String,
    transport: Arc<dyn Transport>,
    tokens: TokenManager,
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("repository", &self.repository)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl RegistryClient {
    /// Creates a client backed by the curl transport.
    pub fn new(repository: impl Into<String>, cache_path: Option<PathBuf>) -> Self {
        Self::with_transport(
            repository,
            DEFAULT_REGISTRY,
            cache_path,
            Arc::new(CurlTransport::new()),
        )
    }

    /// Creates a client with an explicit registry host and transport.
    pub fn with_transport(
        repository: impl Into<String>,
        registry: impl Into<String>,
        cache_path: Option<PathBuf>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let repository = repository.into();
        let registry = registry.into();
        let tokens = TokenManager::new(
            repository.clone(),
            registry.clone(),
            cache_path,
            transport.clone(),
        );
        Self {
            repository,
            registry,
            transport,
            tokens,
        }
    }

    /// The token manager backing this client.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Fetches the complete raw tag list, following pagination.
    ///
    /// A page failure after at least one successful page returns the tags
    /// collected so far; a first-page failure (or no token at all) is an
    /// error.
    #[instrument(skip(self), fields(repository = %self.repository))]
    pub async fn list_all_tags(&self) -> Result<Vec<String>, FetchError> {
        let mut token = self.tokens.get_token().await?;

        let mut next_url = Some(format!(
            "https://{}/v2/{}/tags/list?n={PAGE_SIZE}",
            self.registry, self.repository
        ));
        let mut all_tags: Vec<String> = Vec::new();
        let mut page_count: u32 = 0;

        while let Some(next) = next_url {
            if page_count >= MAX_PAGES {
                warn!(pages = page_count, "Hit maximum page limit");
                break;
            }
            page_count += 1;

            let url = self.normalize_url(&next);
            debug!(page = page_count, url = %url, "Fetching tag page");

            match self.fetch_page(&url, &mut token).await {
                Ok(page) => {
                    debug!(
                        page = page_count,
                        tags = page.tags.len(),
                        total = all_tags.len() + page.tags.len(),
                        "Page fetched"
                    );
                    all_tags.extend(page.tags);
                    next_url = page.next_url;
                }
                Err(err) => {
                    if all_tags.is_empty() {
                        return Err(err);
                    }
                    // Later-page failure: keep what we have.
                    warn!(
                        page = page_count,
                        error = %err,
                        collected = all_tags.len(),
                        "Page fetch failed, returning tags collected so far"
                    );
                    break;
                }
            }
        }

        debug!(
            tags = all_tags.len(),
            pages = page_count,
            "Pagination complete"
        );
        Ok(all_tags)
    }

    /// Fetches the raw list and runs it through the curation pipeline.
    pub async fn list_tags_filtered(
        &self,
        policy: &RepositoryPolicy,
        context: Option<ChannelContext>,
        limit: usize,
    ) -> Result<Vec<String>, FetchError> {
        let tags = self.list_all_tags().await?;
        let mut filter = TagFilter::new(policy, context);
        Ok(filter.filter_and_sort(&tags, limit))
    }

    /// Fetches one page, refreshing the token at most once on 401/403.
    async fn fetch_page(&self, url: &str, token: &mut String) -> Result<TagPage, FetchError> {
        let mut auth_retries = 0u8;

        loop {
            let output = self
                .transport
                .fetch(url, Some(token), &FetchOptions::page())
                .await?;
            if !output.success() {
                return Err(FetchError::CommandFailed {
                    code: output.exit_code,
                    stderr: output.stderr,
                });
            }

            let response =
                parse_response(&output.stdout).ok_or(FetchError::MalformedResponse)?;
            debug!(status = %response.status_line, "Page response");

            if response.is_auth_error() {
                // Bounded: one invalidate-and-refetch per page, never a loop.
                if auth_retries >= 1 {
                    return Err(FetchError::AuthRetryExhausted);
                }
                auth_retries += 1;
                debug!(status = %response.status_line, "Auth rejected, refreshing token");
                self.tokens.invalidate();
                *token = self.tokens.get_token().await?;
                continue;
            }

            let body = response.body.trim();
            if body.is_empty() {
                return Err(FetchError::EmptyBody);
            }
            if body.starts_with(r#"{"errors":"#) {
                return Err(FetchError::Registry(body.to_string()));
            }

            let parsed: TagListResponse = serde_json::from_str(body)?;
            let next_url = response.header("link").and_then(parse_link_header);

            return Ok(TagPage {
                tags: parsed.tags,
                next_url,
            });
        }
    }

    /// Resolves a Link-header URL against the registry host.
    ///
    /// Link targets may be absolute, root-relative, or bare paths.
    fn normalize_url(&self, next: &str) -> String {
        if next.starts_with("http") {
            next.to_string()
        } else if next.starts_with('/') {
            format!("https://{}{next}", self.registry)
        } else {
            format!("https://{}/{next}", self.registry)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
