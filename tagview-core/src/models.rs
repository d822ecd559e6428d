//! Domain models shared across the tagview crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Channel Context
// ============================================================================

/// A deployment track used to scope which tags are relevant.
///
/// The context comes from the trailing `:tag` segment of a container URL,
/// e.g. `ghcr.io/ublue-os/bazzite:testing` has the `testing` context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelContext {
    /// Pre-release testing track.
    Testing,
    /// Stable release track.
    Stable,
    /// Unstable/nightly track.
    Unstable,
    /// Latest track.
    Latest,
}

impl ChannelContext {
    /// All known contexts, in display order.
    pub const ALL: [ChannelContext; 4] = [
        ChannelContext::Testing,
        ChannelContext::Stable,
        ChannelContext::Unstable,
        ChannelContext::Latest,
    ];

    /// Returns the lowercase name used in tags and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Testing => "testing",
            Self::Stable => "stable",
            Self::Unstable => "unstable",
            Self::Latest => "latest",
        }
    }
}

impl fmt::Display for ChannelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChannelContext {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "testing" => Ok(Self::Testing),
            "stable" => Ok(Self::Stable),
            "unstable" => Ok(Self::Unstable),
            "latest" => Ok(Self::Latest),
            _ => Err(()),
        }
    }
}

// ============================================================================
// Tag Page
// ============================================================================

/// One page of a paginated tag listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPage {
    /// The tags on this page, in registry order.
    pub tags: Vec<String>,
    /// The URL of the next page, taken from the `Link` header.
    pub next_url: Option<String>,
}

impl TagPage {
    /// Returns true if this is the final page.
    pub fn is_last(&self) -> bool {
        self.next_url.is_none()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_round_trip() {
        for ctx in ChannelContext::ALL {
            assert_eq!(ctx.as_str().parse::<ChannelContext>(), Ok(ctx));
        }
    }

    #[test]
    fn test_context_rejects_unknown() {
        assert!("nightly".parse::<ChannelContext>().is_err());
        assert!("".parse::<ChannelContext>().is_err());
        assert!("Testing".parse::<ChannelContext>().is_err());
    }

    #[test]
    fn test_tag_page_is_last() {
        let page = TagPage {
            tags: vec!["a".to_string()],
            next_url: None,
        };
        assert!(page.is_last());

        let page = TagPage {
            tags: vec![],
            next_url: Some("/v2/foo/tags/list?last=a".to_string()),
        };
        assert!(!page.is_last());
    }
}
