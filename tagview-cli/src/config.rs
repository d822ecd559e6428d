//! Configuration loading.
//!
//! Policies and settings come from a TOML file under the user config
//! dir, with built-in defaults for the repositories the tool is usually
//! pointed at. Every policy is validated at load time so the pipeline
//! downstream never sees a broken pattern.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use tagview_core::{CoreError, RepositoryPolicy, TransformRule};
use tagview_core::policy::LatestDotHandling;

/// Default maximum number of tags shown.
const MAX_TAGS_DISPLAY: usize = 30;

// ============================================================================
// Config Types
// ============================================================================

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Global settings.
    #[serde(default)]
    pub settings: Settings,
    /// Per-repository policies, keyed by `owner/name`.
    #[serde(default)]
    pub repositories: HashMap<String, RepositoryPolicy>,
    /// Container URLs offered by the collaborator layer.
    #[serde(default)]
    pub container_urls: ContainerUrls,
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Maximum number of tags shown after curation.
    #[serde(default = "default_max_tags")]
    pub max_tags_display: usize,
    /// Registry host queried for tags.
    #[serde(default = "default_registry")]
    pub registry: String,
    /// Override for the token cache file path.
    #[serde(default)]
    pub token_cache_path: Option<PathBuf>,
}

/// Known container URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerUrls {
    /// Default URL offered when none is given.
    #[serde(default = "default_container_url")]
    pub default: String,
    /// All configured URLs, in display order.
    #[serde(default = "default_container_options")]
    pub options: Vec<String>,
}

fn default_max_tags() -> usize {
    MAX_TAGS_DISPLAY
}

fn default_registry() -> String {
    tagview_fetch::DEFAULT_REGISTRY.to_string()
}

fn default_container_url() -> String {
    "ghcr.io/wombatfromhell/bazzite-nix:testing".to_string()
}

fn default_container_options() -> Vec<String> {
    [
        "ghcr.io/wombatfromhell/bazzite-nix:testing",
        "ghcr.io/wombatfromhell/bazzite-nix:stable",
        "ghcr.io/wombatfromhell/bazzite-nix-cachyos:testing",
        "ghcr.io/wombatfromhell/bazzite-nvidia-open-nix:stable",
        "ghcr.io/ublue-os/bazzite:testing",
        "ghcr.io/ublue-os/bazzite:stable",
        "ghcr.io/ublue-os/bazzite-nvidia-open:stable",
        "ghcr.io/astrovm/amyos:latest",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_tags_display: default_max_tags(),
            registry: default_registry(),
            token_cache_path: None,
        }
    }
}

impl Default for ContainerUrls {
    fn default() -> Self {
        Self {
            default: default_container_url(),
            options: default_container_options(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            repositories: default_repositories(),
            container_urls: ContainerUrls::default(),
        }
    }
}

// ============================================================================
// Built-in Policies
// ============================================================================

fn standard_filter_patterns() -> Vec<String> {
    [
        r"^sha256-.*\.sig$",
        r"^sha256-.*",
        r"^sha256:.*",
        r"^[0-9a-fA-F]{40,64}$",
        r"^<.*>$",
        r"^(latest|testing|stable|unstable)$",
        r"^testing\..*",
        r"^stable\..*",
        r"^unstable\..*",
        r"^\d{1,2}$",
        r"^(latest|testing|stable|unstable)-\d{1,2}$",
        r"^\d{1,2}-(testing|stable|unstable)$",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn standard_policy() -> RepositoryPolicy {
    RepositoryPolicy {
        include_sha256_tags: false,
        filter_patterns: standard_filter_patterns(),
        ignore_tags: ["latest", "testing", "stable", "unstable"]
            .into_iter()
            .map(String::from)
            .collect(),
        ..Default::default()
    }
}

/// Policy for repositories whose latest channel is published as
/// `latest.YYYYMMDD` tags rewritten to bare dates.
fn date_only_policy() -> RepositoryPolicy {
    RepositoryPolicy {
        include_sha256_tags: false,
        filter_patterns: [
            r"^sha256-.*\.sig$",
            r"^<.*>$",
            r"^(testing|stable|unstable)$",
            r"^testing\..*",
            r"^stable\..*",
            r"^unstable\..*",
            r"^\d{1,2}$",
            r"^(latest|testing|stable|unstable)-\d{1,2}$",
            r"^\d{1,2}-(testing|stable|unstable)$",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        ignore_tags: ["testing", "stable", "unstable"]
            .into_iter()
            .map(String::from)
            .collect(),
        transform_patterns: vec![TransformRule {
            pattern: r"^latest\.(\d{8})$".to_string(),
            replacement: "$1".to_string(),
        }],
        latest_dot_handling: LatestDotHandling::TransformDatesOnly,
        date_only_latest_channel: true,
    }
}

fn default_repositories() -> HashMap<String, RepositoryPolicy> {
    let mut repositories = HashMap::new();
    for repo in [
        "wombatfromhell/bazzite-nix",
        "wombatfromhell/bazzite-nix-cachyos",
        "wombatfromhell/bazzite-nvidia-open-nix",
        "ublue-os/bazzite",
        "ublue-os/bazzite-nvidia-open",
    ] {
        repositories.insert(repo.to_string(), standard_policy());
    }
    repositories.insert("astrovm/amyos".to_string(), date_only_policy());
    repositories
}

// ============================================================================
// Loading
// ============================================================================

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tagview")
            .join("config.toml")
    }

    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::default_path())
    }

    /// Loads configuration from a specific path, defaulting when absent.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Other(format!("could not read config: {e}")))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CoreError::Other(format!("could not parse config: {e}")))?;
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Validates every repository policy.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (repo, policy) in &self.repositories {
            policy.validate().map_err(|e| {
                CoreError::InvalidPolicy(format!("repository '{repo}': {e}"))
            })?;
        }
        if self.settings.max_tags_display == 0 {
            return Err(CoreError::InvalidPolicy(
                "max_tags_display must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the policy for a repository, defaulting to an empty one.
    pub fn policy_for(&self, repository: &str) -> RepositoryPolicy {
        self.repositories
            .get(repository)
            .cloned()
            .unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
