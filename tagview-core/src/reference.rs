//! Container URL parsing.
//!
//! A target URL like `ghcr.io/ublue-os/bazzite:testing` carries both the
//! repository (`ublue-os/bazzite`) and an optional channel context
//! (`testing`). Tags that are not a known channel name carry no context.

use crate::error::CoreError;
use crate::models::ChannelContext;

/// Registry hosts whose prefix is stripped when extracting the repository.
const KNOWN_REGISTRIES: [&str; 4] = ["ghcr.io/", "docker.io/", "quay.io/", "gcr.io/"];

/// A parsed container image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// The `owner/name` repository id, without registry host or tag.
    pub repository: String,
    /// Channel context extracted from the trailing `:tag`, if it names one.
    pub context: Option<ChannelContext>,
}

impl ImageReference {
    /// Parses a container URL into repository and context.
    ///
    /// The registry host prefix is dropped when it is one of the known
    /// public registries; otherwise the URL is taken as `repo[:tag]`.
    pub fn parse(url: &str) -> Result<Self, CoreError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(CoreError::InvalidReference("empty URL".to_string()));
        }

        let without_registry = KNOWN_REGISTRIES
            .iter()
            .find_map(|prefix| url.strip_prefix(prefix))
            .unwrap_or(url);

        let repository = without_registry
            .split(':')
            .next()
            .unwrap_or(without_registry)
            .to_string();
        if repository.is_empty() {
            return Err(CoreError::InvalidReference(format!(
                "no repository in '{url}'"
            )));
        }

        // The context is only meaningful when the tag names a known channel.
        let context = url
            .rsplit_once(':')
            .and_then(|(_, tag)| tag.parse::<ChannelContext>().ok());

        Ok(Self {
            repository,
            context,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_registry_and_context() {
        let r = ImageReference::parse("ghcr.io/ublue-os/bazzite:testing").unwrap();
        assert_eq!(r.repository, "ublue-os/bazzite");
        assert_eq!(r.context, Some(ChannelContext::Testing));
    }

    #[test]
    fn test_parse_without_tag() {
        let r = ImageReference::parse("ghcr.io/astrovm/amyos").unwrap();
        assert_eq!(r.repository, "astrovm/amyos");
        assert_eq!(r.context, None);
    }

    #[test]
    fn test_parse_unknown_tag_has_no_context() {
        let r = ImageReference::parse("ghcr.io/owner/name:41.20240102").unwrap();
        assert_eq!(r.repository, "owner/name");
        assert_eq!(r.context, None);
    }

    #[test]
    fn test_parse_without_registry_prefix() {
        let r = ImageReference::parse("owner/name:stable").unwrap();
        assert_eq!(r.repository, "owner/name");
        assert_eq!(r.context, Some(ChannelContext::Stable));
    }

    #[test]
    fn test_parse_other_registries() {
        for host in ["docker.io", "quay.io", "gcr.io"] {
            let r = ImageReference::parse(&format!("{host}/owner/name:latest")).unwrap();
            assert_eq!(r.repository, "owner/name");
            assert_eq!(r.context, Some(ChannelContext::Latest));
        }
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert!(ImageReference::parse("").is_err());
        assert!(ImageReference::parse("   ").is_err());
    }
}
