//! Fetch error types.

use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for registry fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Subprocess transport failed.
    #[error("Transport error: {0}")]
    Transport(#[from] ProcessError),

    /// Token management failed.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// The transfer utility exited unsuccessfully.
    #[error("Transfer command exited with code {code}: {stderr}")]
    CommandFailed {
        /// Exit code from the process.
        code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// No header/body boundary could be found in the raw response.
    #[error("Malformed response: no header/body boundary")]
    MalformedResponse,

    /// The response body was empty.
    #[error("Empty response body")]
    EmptyBody,

    /// The registry returned an OCI error envelope.
    #[error("Registry error: {0}")]
    Registry(String),

    /// Authentication still failed after the single bounded retry.
    #[error("Authentication failed after token refresh")]
    AuthRetryExhausted,

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] tagview_core::CoreError),
}

// ============================================================================
// Process Error
// ============================================================================

/// Error type for subprocess transport operations.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Transfer utility not found on PATH.
    #[error("Command not found: {0}")]
    NotFound(String),

    /// Command timed out.
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Token Error
// ============================================================================

/// Error type for token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Subprocess transport failed.
    #[error("Transport error: {0}")]
    Transport(#[from] ProcessError),

    /// The token endpoint request failed.
    #[error("Token request exited with code {code}: {stderr}")]
    RequestFailed {
        /// Exit code from the process.
        code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// The token endpoint response had no `token` field.
    #[error("Token response missing token field")]
    MissingToken,

    /// The probe response was not a numeric HTTP status.
    #[error("Invalid probe status: {0:?}")]
    InvalidStatus(String),

    /// The refreshed token was also rejected.
    #[error("Token rejected with HTTP {0} after refresh")]
    Rejected(u16),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error reading or writing the cache file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
