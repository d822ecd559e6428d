//! Bearer token management.
//!
//! Tokens are pull-scoped per repository and cached as the sole content
//! of a single plain-text file. There is no expiry metadata and no
//! proactive revalidation: a cached token is returned unconditionally
//! and replaced only after the registry rejects it with 401/403.
//!
//! The cache file holds one token at a time. When several clients share
//! the default path, a token scoped to one repository can be served for
//! another until it is rejected; callers that care pass a per-repository
//! cache path.

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::error::TokenError;
use crate::transport::{FetchOptions, Transport};

/// File name of the default single-slot cache, under the OS temp dir.
const DEFAULT_CACHE_FILE: &str = "tagview_registry_token";

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

// ============================================================================
// Token Manager
// ============================================================================

/// Caches, fetches, invalidates, and validates bearer tokens.
pub struct TokenManager {
    repository: String,
    registry: String,
    cache_path: PathBuf,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("repository", &self.repository)
            .field("registry", &self.registry)
            .field("cache_path", &self.cache_path)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Creates a token manager for one repository.
    ///
    /// `cache_path` defaults to a single shared file under the OS temp
    /// dir when not given.
    pub fn new(
        repository: impl Into<String>,
        registry: impl Into<String>,
        cache_path: Option<PathBuf>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            repository: repository.into(),
            registry: registry.into(),
            cache_path: cache_path.unwrap_or_else(Self::default_cache_path),
            transport,
        }
    }

    /// The default single-slot cache location.
    pub fn default_cache_path() -> PathBuf {
        std::env::temp_dir().join(DEFAULT_CACHE_FILE)
    }

    /// The cache path in use.
    pub fn cache_path(&self) -> &PathBuf {
        &self.cache_path
    }

    /// Returns a token, from cache when present, freshly issued otherwise.
    ///
    /// A cached token is trusted unconditionally; staleness surfaces as a
    /// 401/403 downstream and is handled reactively.
    #[instrument(skip(self))]
    pub async fn get_token(&self) -> Result<String, TokenError> {
        if self.cache_path.exists() {
            match std::fs::read_to_string(&self.cache_path) {
                Ok(content) => {
                    debug!(path = %self.cache_path.display(), "Using cached token");
                    return Ok(content.trim().to_string());
                }
                Err(e) => {
                    warn!(path = %self.cache_path.display(), error = %e, "Could not read cached token");
                }
            }
        }

        debug!("No cached token, requesting a new one");
        let url = format!(
            "https://{}/token?scope=repository:{}:pull",
            self.registry, self.repository
        );
        let output = self
            .transport
            .fetch(&url, None, &FetchOptions::default())
            .await?;
        if !output.success() {
            return Err(TokenError::RequestFailed {
                code: output.exit_code,
                stderr: output.stderr,
            });
        }

        let response: TokenResponse = serde_json::from_str(&output.stdout)?;
        let token = response.token.ok_or(TokenError::MissingToken)?;

        self.cache(&token);
        Ok(token)
    }

    /// Deletes the cached token; an already-absent file is success.
    pub fn invalidate(&self) {
        match std::fs::remove_file(&self.cache_path) {
            Ok(()) => debug!(path = %self.cache_path.display(), "Invalidated token cache"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.cache_path.display(), "Token cache already absent");
            }
            Err(e) => warn!(path = %self.cache_path.display(), error = %e, "Could not remove token cache"),
        }
    }

    /// Probes `probe_url` with the token and refreshes it once if rejected.
    ///
    /// HTTP 200 keeps the token; 401/403 triggers exactly one
    /// invalidate-refetch-reprobe cycle; any other status passes the
    /// token through optimistically.
    #[instrument(skip(self, token))]
    pub async fn validate_and_retry(
        &self,
        token: &str,
        probe_url: &str,
    ) -> Result<String, TokenError> {
        let status = self.probe(probe_url, token).await?;

        if status == 200 {
            debug!("Token validation successful");
            return Ok(token.to_string());
        }

        if status == 401 || status == 403 {
            debug!(status = status, "Token rejected, fetching a replacement");
            self.invalidate();

            let fresh = self.get_token().await?;
            let status = self.probe(probe_url, &fresh).await?;
            if status == 200 {
                debug!("Replacement token validated");
                return Ok(fresh);
            }
            error!(status = status, "Replacement token also rejected");
            return Err(TokenError::Rejected(status));
        }

        // Anything else is not an auth verdict; keep going with what we have.
        debug!(status = status, "Unexpected probe status, keeping token");
        Ok(token.to_string())
    }

    /// Issues a status-only probe and parses the HTTP code.
    async fn probe(&self, url: &str, token: &str) -> Result<u16, TokenError> {
        let output = self
            .transport
            .fetch(url, Some(token), &FetchOptions::status_probe())
            .await?;
        let code = output.stdout.trim();
        code.parse::<u16>()
            .map_err(|_| TokenError::InvalidStatus(code.to_string()))
    }

    /// Persists a token; a write failure loses only the caching.
    fn cache(&self, token: &str) {
        match std::fs::write(&self.cache_path, token) {
            Ok(()) => debug!(path = %self.cache_path.display(), "Cached new token"),
            Err(e) => debug!(path = %self.cache_path.display(), error = %e, "Could not cache token"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
