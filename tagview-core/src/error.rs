//! Core error types for `tagview`.

use thiserror::Error;

/// Core error type for `tagview` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A repository policy failed validation.
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// A container URL could not be resolved to a repository.
    #[error("Invalid image reference: {0}")]
    InvalidReference(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
