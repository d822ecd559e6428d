// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # tagview Core
//!
//! Core types and the tag curation pipeline for tagview.
//!
//! This crate is pure: it knows nothing about registries, subprocesses,
//! or files. It provides:
//!
//! - Domain models ([`ChannelContext`], [`TagPage`])
//! - Container URL parsing ([`ImageReference`])
//! - Repository policies ([`RepositoryPolicy`], validated at construction)
//! - The filter/transform/dedup/sort pipeline ([`TagFilter`])
//!
//! The pipeline is total: every input tag maps to a keep/drop decision
//! and, when kept, a deterministic sort key. Re-running it on its own
//! output is a no-op.

pub mod error;
pub mod filter;
pub mod models;
pub mod policy;
pub mod reference;

// Re-export error types
pub use error::CoreError;

// Re-export model types
pub use models::{ChannelContext, TagPage};

// Re-export reference parsing
pub use reference::ImageReference;

// Re-export policy types
pub use policy::{LatestDotHandling, RepositoryPolicy, TransformRule};

// Re-export the pipeline
pub use filter::{PatternCache, TagFilter};
