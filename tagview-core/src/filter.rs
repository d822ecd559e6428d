//! The tag curation pipeline.
//!
//! [`TagFilter`] turns the raw tag list of a repository into the curated
//! list shown to the user. The pipeline is pure and total: every tag maps
//! to a keep/drop decision and, when kept, a deterministic sort key. It
//! performs no I/O and never fails.
//!
//! Stages, in order:
//!
//! 1. drop unwanted tags (ignore list, drop patterns, signatures, digests)
//! 2. restrict to the requested channel context, when one is given
//! 3. rewrite tags through the policy's transform rules
//! 4. collapse duplicates that name the same underlying release
//! 5. sort newest-first, with unrecognized tags trailing
//! 6. truncate to the display limit

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::ChannelContext;
use crate::policy::RepositoryPolicy;

/// Channel prefixes that mark a tag as belonging to a deployment track.
const CHANNEL_PREFIXES: [&str; 3] = ["testing-", "stable-", "unstable-"];

/// Rank offset that puts channel-prefixed tags above plain ones.
const CHANNEL_RANK: u64 = 10_000;

// ============================================================================
// Built-in Patterns
// ============================================================================

fn channel_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(testing|stable|unstable)-(\d{2})\.(\d{8})(?:\.(\d+))?$")
            .expect("Invalid regex")
    })
}

fn channel_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(testing|stable|unstable)-(\d{8})(?:\.(\d+))?$").expect("Invalid regex")
    })
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2})\.(\d{8})(?:\.(\d+))?$").expect("Invalid regex"))
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{8})(?:\.(\d+))?$").expect("Invalid regex"))
}

fn any_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:testing-|stable-|unstable-)?(\d{2})\.(\d{8})(?:\.(\d+))?$")
            .expect("Invalid regex")
    })
}

fn any_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:testing-|stable-|unstable-)?(\d{8})(?:\.(\d+))?$").expect("Invalid regex")
    })
}

fn bare_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{8}$").expect("Invalid regex"))
}

// ============================================================================
// Pattern Cache
// ============================================================================

/// Explicit memoizing cache for policy-supplied patterns.
///
/// Owned by the filter rather than hidden in global state; it is a pure
/// function of the pattern string, so sharing one across calls is safe.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: HashMap<String, Option<Regex>>,
}

impl PatternCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled form of `pattern`, compiling on first use.
    ///
    /// Policies are validated at construction, so a pattern that fails to
    /// compile here is treated as non-matching instead of failing the
    /// pipeline.
    pub fn get(&mut self, pattern: &str) -> Option<&Regex> {
        self.compiled
            .entry(pattern.to_string())
            .or_insert_with(|| Regex::new(pattern).ok())
            .as_ref()
    }
}

/// Matches the way the legacy rules expect: anchored at the tag start.
fn matches_at_start(re: &Regex, text: &str) -> bool {
    re.find(text).is_some_and(|m| m.start() == 0)
}

/// Returns true if the tag carries a channel prefix.
fn is_channel_prefixed(tag: &str) -> bool {
    CHANNEL_PREFIXES.iter().any(|p| tag.starts_with(p))
}

// ============================================================================
// Version Key
// ============================================================================

/// Identity used to recognize two differently-prefixed tags as the same
/// underlying release.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum VersionKey {
    /// `[prefix-]SERIES.YYYYMMDD[.SUBVER]` or `[prefix-]YYYYMMDD[.SUBVER]`,
    /// with the channel prefix stripped. Date-only tags use an empty series.
    Release {
        series: String,
        date: String,
        subver: String,
    },
    /// Any other tag keys on its own text.
    Literal(String),
}

fn version_key(tag: &str) -> VersionKey {
    if let Some(caps) = any_version_re().captures(tag) {
        return VersionKey::Release {
            series: caps[1].to_string(),
            date: caps[2].to_string(),
            subver: caps.get(3).map_or_else(|| "0".to_string(), |m| m.as_str().to_string()),
        };
    }
    if let Some(caps) = any_date_re().captures(tag) {
        return VersionKey::Release {
            series: String::new(),
            date: caps[1].to_string(),
            subver: caps.get(2).map_or_else(|| "0".to_string(), |m| m.as_str().to_string()),
        };
    }
    VersionKey::Literal(tag.to_string())
}

// ============================================================================
// Sort Key
// ============================================================================

/// Ordering key for the final sort.
///
/// The list is sorted by this key descending. Recognized tags order by
/// date, then subversion, then rank (channel-prefixed above plain);
/// everything else falls into a trailing group ordered by the legacy
/// character-code comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    // Declared first so every Alphabetical key orders below every Dated key.
    Alphabetical(Vec<u32>),
    Dated {
        year: u64,
        month: u64,
        day: u64,
        subver: u64,
        rank: u64,
    },
}

fn num(s: &str) -> u64 {
    s.parse().unwrap_or(0)
}

fn dated(date8: &str, subver: Option<&str>, rank: u64) -> SortKey {
    SortKey::Dated {
        year: num(&date8[..4]),
        month: num(&date8[4..6]),
        day: num(&date8[6..8]),
        subver: subver.map_or(0, num),
        rank,
    }
}

fn sort_key(tag: &str) -> SortKey {
    if let Some(caps) = channel_version_re().captures(tag) {
        return dated(
            &caps[3],
            caps.get(4).map(|m| m.as_str()),
            CHANNEL_RANK + num(&caps[2]),
        );
    }
    if let Some(caps) = channel_date_re().captures(tag) {
        return dated(&caps[2], caps.get(3).map(|m| m.as_str()), CHANNEL_RANK);
    }
    if let Some(caps) = version_re().captures(tag) {
        return dated(&caps[2], caps.get(3).map(|m| m.as_str()), num(&caps[1]));
    }
    if let Some(caps) = date_re().captures(tag) {
        return dated(&caps[1], caps.get(2).map(|m| m.as_str()), 0);
    }
    SortKey::Alphabetical(tag.chars().map(u32::from).collect())
}

// ============================================================================
// Tag Filter
// ============================================================================

/// Filters, transforms, deduplicates, and sorts a raw tag list.
#[derive(Debug)]
pub struct TagFilter<'a> {
    policy: &'a RepositoryPolicy,
    context: Option<ChannelContext>,
    patterns: PatternCache,
}

impl<'a> TagFilter<'a> {
    /// Creates a filter for one repository policy and optional context.
    pub fn new(policy: &'a RepositoryPolicy, context: Option<ChannelContext>) -> Self {
        Self {
            policy,
            context,
            patterns: PatternCache::new(),
        }
    }

    /// Runs the full pipeline and returns at most `limit` tags.
    pub fn filter_and_sort(&mut self, tags: &[String], limit: usize) -> Vec<String> {
        let kept: Vec<&String> = tags.iter().filter(|t| !self.should_filter(t)).collect();
        let kept = self.context_filter(kept);
        let transformed: Vec<String> = kept.iter().map(|t| self.transform(t)).collect();
        let mut deduplicated = deduplicate(transformed);
        deduplicated.sort_by_cached_key(|tag| std::cmp::Reverse(sort_key(tag)));
        deduplicated.truncate(limit);
        deduplicated
    }

    /// Decides whether a single tag is dropped by the policy.
    pub fn should_filter(&mut self, tag: &str) -> bool {
        let lower = tag.to_lowercase();

        // latest.<suffix> is dropped unless the suffix is an 8+ digit date,
        // which survives for later transformation into a bare date.
        if let Some(suffix) = lower.strip_prefix("latest.") {
            if suffix.len() < 8 || !suffix.chars().all(|c| c.is_ascii_digit()) {
                return true;
            }
        }

        if self
            .policy
            .ignore_tags
            .iter()
            .any(|t| t.to_lowercase() == lower)
        {
            return true;
        }

        for pattern in &self.policy.filter_patterns {
            if let Some(re) = self.patterns.get(pattern) {
                if matches_at_start(re, &lower) {
                    return true;
                }
            }
        }

        // Cosign signature tags.
        if lower.ends_with(".sig") && lower.contains("sha256-") {
            return true;
        }

        // Bare sha256 digests, unless the policy keeps them.
        if !self.policy.include_sha256_tags
            && tag.len() == 64
            && tag.chars().all(|c| c.is_ascii_hexdigit())
        {
            return true;
        }

        false
    }

    /// Rewrites a tag through the first matching transform rule.
    pub fn transform(&mut self, tag: &str) -> String {
        for rule in &self.policy.transform_patterns {
            if let Some(re) = self.patterns.get(&rule.pattern) {
                if matches_at_start(re, tag) {
                    return re.replace_all(tag, rule.replacement.as_str()).into_owned();
                }
            }
        }
        tag.to_string()
    }

    /// Restricts the list to the requested channel, when one is set.
    fn context_filter<'t>(&self, tags: Vec<&'t String>) -> Vec<&'t String> {
        let Some(context) = self.context else {
            return tags;
        };

        // Repositories whose latest channel is published as bare dates keep
        // exact YYYYMMDD tags instead of `latest-` prefixed ones.
        if self.policy.date_only_latest_channel && context == ChannelContext::Latest {
            return tags
                .into_iter()
                .filter(|t| bare_date_re().is_match(t))
                .collect();
        }

        let prefix = format!("{context}-");
        tags.into_iter()
            .filter(|t| t.starts_with(&prefix))
            .collect()
    }
}

/// Collapses tags sharing a [`VersionKey`], preferring channel-prefixed
/// candidates on collision and preserving first-seen order otherwise.
fn deduplicate(tags: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<VersionKey, usize> = HashMap::new();
    let mut kept: Vec<String> = Vec::with_capacity(tags.len());

    for tag in tags {
        let key = version_key(&tag);
        match seen.get(&key) {
            None => {
                seen.insert(key, kept.len());
                kept.push(tag);
            }
            Some(&slot) => {
                // A prefixed tag displaces a plain one; a second prefixed
                // tag for the same release never displaces the first.
                if is_channel_prefixed(&tag) && !is_channel_prefixed(&kept[slot]) {
                    kept[slot] = tag;
                }
            }
        }
    }

    kept
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{LatestDotHandling, TransformRule};

    fn strings(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| (*t).to_string()).collect()
    }

    fn standard_policy() -> RepositoryPolicy {
        RepositoryPolicy {
            include_sha256_tags: false,
            filter_patterns: vec![
                r"^sha256-.*\.sig$".to_string(),
                r"^sha256-.*".to_string(),
                r"^sha256:.*".to_string(),
                r"^[0-9a-fA-F]{40,64}$".to_string(),
                r"^<.*>$".to_string(),
                r"^(latest|testing|stable|unstable)$".to_string(),
                r"^testing\..*".to_string(),
                r"^stable\..*".to_string(),
                r"^unstable\..*".to_string(),
                r"^\d{1,2}$".to_string(),
                r"^(latest|testing|stable|unstable)-\d{1,2}$".to_string(),
                r"^\d{1,2}-(testing|stable|unstable)$".to_string(),
            ],
            ignore_tags: strings(&["latest", "testing", "stable", "unstable"]),
            ..Default::default()
        }
    }

    fn date_only_policy() -> RepositoryPolicy {
        RepositoryPolicy {
            ignore_tags: strings(&["testing", "stable", "unstable"]),
            transform_patterns: vec![TransformRule {
                pattern: r"^latest\.(\d{8})$".to_string(),
                replacement: "$1".to_string(),
            }],
            latest_dot_handling: LatestDotHandling::TransformDatesOnly,
            date_only_latest_channel: true,
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------
    // should_filter
    // ------------------------------------------------------------------

    #[test]
    fn test_latest_dot_non_date_suffix_dropped() {
        let policy = RepositoryPolicy::default();
        let mut filter = TagFilter::new(&policy, None);
        assert!(filter.should_filter("latest."));
        assert!(filter.should_filter("latest.beta"));
        assert!(filter.should_filter("latest.2023"));
        assert!(!filter.should_filter("latest.20231115"));
        assert!(!filter.should_filter("latest.202311150"));
    }

    #[test]
    fn test_ignore_list_is_case_insensitive() {
        let policy = RepositoryPolicy {
            ignore_tags: strings(&["Latest", "testing"]),
            ..Default::default()
        };
        let mut filter = TagFilter::new(&policy, None);
        assert!(filter.should_filter("latest"));
        assert!(filter.should_filter("LATEST"));
        assert!(filter.should_filter("Testing"));
        assert!(!filter.should_filter("stable"));
    }

    #[test]
    fn test_filter_patterns_anchor_at_start() {
        let policy = RepositoryPolicy {
            filter_patterns: vec![r"sha256-".to_string()],
            ..Default::default()
        };
        let mut filter = TagFilter::new(&policy, None);
        assert!(filter.should_filter("sha256-abcdef"));
        // Pattern matches mid-string only, so the tag survives.
        assert!(!filter.should_filter("tag-sha256-abcdef"));
    }

    #[test]
    fn test_signature_tags_dropped() {
        let policy = RepositoryPolicy::default();
        let mut filter = TagFilter::new(&policy, None);
        assert!(filter.should_filter("sha256-abc123.sig"));
        assert!(filter.should_filter("SHA256-ABC123.SIG"));
        assert!(!filter.should_filter("release.sig"));
    }

    #[test]
    fn test_hex_digest_tags_follow_policy_flag() {
        let digest = "a".repeat(64);
        let policy = RepositoryPolicy::default();
        let mut filter = TagFilter::new(&policy, None);
        assert!(filter.should_filter(&digest));
        // 63 characters is not a digest.
        assert!(!filter.should_filter(&"a".repeat(63)));

        let policy = RepositoryPolicy {
            include_sha256_tags: true,
            ..Default::default()
        };
        let mut filter = TagFilter::new(&policy, None);
        assert!(!filter.should_filter(&digest));
    }

    #[test]
    fn test_mixed_case_hex_digest_dropped() {
        let digest = "AbCdEf0123456789".repeat(4);
        assert_eq!(digest.len(), 64);
        let policy = RepositoryPolicy::default();
        let mut filter = TagFilter::new(&policy, None);
        assert!(filter.should_filter(&digest));
    }

    // ------------------------------------------------------------------
    // transform
    // ------------------------------------------------------------------

    #[test]
    fn test_transform_rewrites_latest_dates() {
        let policy = date_only_policy();
        let mut filter = TagFilter::new(&policy, None);
        assert_eq!(filter.transform("latest.20231115"), "20231115");
        assert_eq!(filter.transform("stable-41.20231115"), "stable-41.20231115");
    }

    #[test]
    fn test_transform_first_matching_rule_wins() {
        let policy = RepositoryPolicy {
            transform_patterns: vec![
                TransformRule {
                    pattern: r"^v(\d+)$".to_string(),
                    replacement: "$1".to_string(),
                },
                TransformRule {
                    pattern: r"^v.*$".to_string(),
                    replacement: "other".to_string(),
                },
            ],
            ..Default::default()
        };
        let mut filter = TagFilter::new(&policy, None);
        assert_eq!(filter.transform("v42"), "42");
        assert_eq!(filter.transform("vNext"), "other");
        assert_eq!(filter.transform("plain"), "plain");
    }

    // ------------------------------------------------------------------
    // context filter
    // ------------------------------------------------------------------

    #[test]
    fn test_context_keeps_prefixed_tags_only() {
        let policy = RepositoryPolicy::default();
        let mut filter = TagFilter::new(&policy, Some(ChannelContext::Testing));
        let out = filter.filter_and_sort(
            &strings(&["testing-41.20231115", "stable-41.20231115", "20231115"]),
            30,
        );
        assert_eq!(out, vec!["testing-41.20231115"]);
    }

    #[test]
    fn test_date_only_latest_channel_keeps_bare_dates() {
        let policy = date_only_policy();
        let mut filter = TagFilter::new(&policy, Some(ChannelContext::Latest));
        let out = filter.filter_and_sort(
            &strings(&["20231115", "20231116", "testing-20231114", "zebra"]),
            30,
        );
        assert_eq!(out, vec!["20231116", "20231115"]);
    }

    // ------------------------------------------------------------------
    // deduplication
    // ------------------------------------------------------------------

    #[test]
    fn test_dedup_prefers_channel_prefixed() {
        let out = deduplicate(strings(&["41.20231115", "testing-41.20231115"]));
        assert_eq!(out, vec!["testing-41.20231115"]);

        // Order reversed: the prefixed tag is kept either way.
        let out = deduplicate(strings(&["testing-41.20231115", "41.20231115"]));
        assert_eq!(out, vec!["testing-41.20231115"]);
    }

    #[test]
    fn test_dedup_keeps_first_prefixed_candidate() {
        let out = deduplicate(strings(&["testing-41.20231115", "stable-41.20231115"]));
        assert_eq!(out, vec!["testing-41.20231115"]);
    }

    #[test]
    fn test_dedup_date_only_tags_share_keys() {
        let out = deduplicate(strings(&["20231115", "stable-20231115"]));
        assert_eq!(out, vec!["stable-20231115"]);
    }

    #[test]
    fn test_dedup_subversions_are_distinct() {
        let out = deduplicate(strings(&["41.20231115.0", "41.20231115.1"]));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_dedup_literal_tags_pass_through() {
        let out = deduplicate(strings(&["zebra", "alpha", "zebra"]));
        assert_eq!(out, vec!["zebra", "alpha"]);
    }

    // ------------------------------------------------------------------
    // sorting
    // ------------------------------------------------------------------

    #[test]
    fn test_reference_sort_order() {
        let policy = RepositoryPolicy::default();
        let mut filter = TagFilter::new(&policy, None);
        let out = filter.filter_and_sort(
            &strings(&[
                "20231116",
                "20231115",
                "testing-42.20231115.0",
                "zebra",
                "alpha",
            ]),
            30,
        );
        assert_eq!(out[0], "20231116");
        assert_eq!(out[out.len() - 2..], ["zebra", "alpha"]);
        assert_eq!(
            out,
            vec![
                "20231116",
                "testing-42.20231115.0",
                "20231115",
                "zebra",
                "alpha"
            ]
        );
    }

    #[test]
    fn test_channel_prefixed_ranks_above_plain_same_date() {
        assert!(sort_key("testing-41.20231115") > sort_key("41.20231115"));
        assert!(sort_key("stable-20231115") > sort_key("20231115"));
        // Date still dominates rank.
        assert!(sort_key("20231116") > sort_key("testing-41.20231115"));
    }

    #[test]
    fn test_subversion_orders_within_same_date() {
        assert!(sort_key("41.20231115.2") > sort_key("41.20231115.1"));
        assert!(sort_key("20231115.1") > sort_key("20231115"));
    }

    #[test]
    fn test_unrecognized_tags_sort_after_recognized() {
        assert!(sort_key("00000101") > sort_key("zzzz"));
    }

    // ------------------------------------------------------------------
    // pipeline
    // ------------------------------------------------------------------

    #[test]
    fn test_pipeline_is_idempotent() {
        let policy = standard_policy();
        let input = strings(&[
            "testing-41.20231115",
            "41.20231115",
            "stable-40.20230101.1",
            "20231116",
            "sha256-deadbeef.sig",
            "latest",
            "weird-tag",
        ]);
        let mut filter = TagFilter::new(&policy, None);
        let once = filter.filter_and_sort(&input, 30);
        let twice = filter.filter_and_sort(&once, 30);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_pipeline_truncates_to_limit() {
        let policy = RepositoryPolicy::default();
        let input: Vec<String> = (1..=20).map(|d| format!("202311{d:02}")).collect();
        let mut filter = TagFilter::new(&policy, None);
        let out = filter.filter_and_sort(&input, 5);
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], "20231120");
    }

    #[test]
    fn test_latest_dates_transform_then_dedup() {
        // latest.YYYYMMDD becomes a bare date and then collides with any
        // prefixed tag for the same day.
        let policy = date_only_policy();
        let mut filter = TagFilter::new(&policy, None);
        let out = filter.filter_and_sort(
            &strings(&["latest.20231115", "testing-20231115", "latest.20231114"]),
            30,
        );
        assert_eq!(out, vec!["testing-20231115", "20231114"]);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let policy = standard_policy();
        let mut filter = TagFilter::new(&policy, Some(ChannelContext::Stable));
        assert!(filter.filter_and_sort(&[], 30).is_empty());
    }

    #[test]
    fn test_pattern_cache_reuses_compiled_patterns() {
        let mut cache = PatternCache::new();
        assert!(cache.get(r"^\d+$").is_some());
        assert!(cache.get(r"^\d+$").is_some());
        assert!(cache.get("[broken").is_none());
        assert_eq!(cache.compiled.len(), 2);
    }
}
