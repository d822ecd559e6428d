//! Repository policies.
//!
//! A policy describes how the raw tag list of one repository is curated:
//! which tags are dropped, which are rewritten, and how the `latest.*`
//! family is treated. Policies come from the configuration layer and are
//! validated up front so the filter pipeline can assume every pattern
//! compiles.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Transform Rule
// ============================================================================

/// A single pattern-to-replacement rewrite rule.
///
/// Replacements use `regex` capture syntax, e.g. `^latest\.(\d{8})$` with
/// replacement `$1` rewrites `latest.20231115` to `20231115`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRule {
    /// Pattern matched against the start of the tag.
    pub pattern: String,
    /// Replacement text, may reference capture groups.
    pub replacement: String,
}

// ============================================================================
// Latest-dot Handling
// ============================================================================

/// How `latest.<suffix>` tags are treated by a policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatestDotHandling {
    /// No special handling.
    #[default]
    None,
    /// `latest.YYYYMMDD` tags are kept and later rewritten to bare dates.
    TransformDatesOnly,
}

// ============================================================================
// Repository Policy
// ============================================================================

/// Filtering and rewrite rules for one repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryPolicy {
    /// Keep 64-character hex digest tags instead of dropping them.
    #[serde(default)]
    pub include_sha256_tags: bool,

    /// Ordered drop patterns, matched case-insensitively at the tag start.
    #[serde(default)]
    pub filter_patterns: Vec<String>,

    /// Exact tags to drop, compared case-insensitively.
    #[serde(default)]
    pub ignore_tags: Vec<String>,

    /// Ordered rewrite rules; the first matching rule wins.
    #[serde(default)]
    pub transform_patterns: Vec<TransformRule>,

    /// Treatment of the `latest.*` tag family.
    #[serde(default)]
    pub latest_dot_handling: LatestDotHandling,

    /// When set, the `latest` channel of this repository is represented by
    /// bare `YYYYMMDD` tags rather than `latest-` prefixed ones.
    #[serde(default)]
    pub date_only_latest_channel: bool,
}

impl RepositoryPolicy {
    /// Validates that every filter and transform pattern compiles.
    ///
    /// Called once when policies are constructed from configuration; the
    /// filter pipeline relies on this and treats a non-compiling pattern
    /// as non-matching rather than failing.
    pub fn validate(&self) -> Result<(), CoreError> {
        for pattern in &self.filter_patterns {
            Regex::new(pattern).map_err(|e| {
                CoreError::InvalidPolicy(format!("invalid filter pattern '{pattern}': {e}"))
            })?;
        }
        for rule in &self.transform_patterns {
            Regex::new(&rule.pattern).map_err(|e| {
                CoreError::InvalidPolicy(format!(
                    "invalid transform pattern '{}': {e}",
                    rule.pattern
                ))
            })?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
