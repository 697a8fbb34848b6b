//! Fuzzy title matching as an ordered cascade of pure rules.
//!
//! The relation is symmetric but not transitive: use it for one-to-one
//! candidate comparisons, never to build equivalence classes.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::matching::alias::{AliasTable, default_table};
use crate::matching::normalize::{NormalizedKey, normalize_key};

/// Minimum share of the smaller token set that must be shared.
pub const DEFAULT_TOKEN_OVERLAP_THRESHOLD: f64 = 0.6;

/// Cascade order used when no other order is configured.
pub const DEFAULT_RULE_ORDER: [MatchRule; 4] = [
    MatchRule::Exact,
    MatchRule::Substring,
    MatchRule::Alias,
    MatchRule::TokenOverlap,
];

/// One step of the matching cascade.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Normalized keys are identical.
    Exact,
    /// One normalized key contains the other.
    Substring,
    /// Some alias variant of one key equals, contains or is contained by
    /// some alias variant of the other.
    Alias,
    /// Enough whitespace tokens are shared.
    TokenOverlap,
}

impl MatchRule {
    /// Stable string representation (for logs and reports).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Substring => "substring",
            Self::Alias => "alias",
            Self::TokenOverlap => "token_overlap",
        }
    }

    fn applies(self, pair: &KeyPair<'_>, aliases: &AliasTable, threshold: f64) -> bool {
        match self {
            Self::Exact => pair.a == pair.b,
            Self::Substring => contains_either(pair.a.as_str(), pair.b.as_str()),
            Self::Alias => alias_match(pair, aliases),
            Self::TokenOverlap => token_overlap(pair.a, pair.b) >= threshold,
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tunables for the cascade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Rules evaluated in order; the first satisfied one decides.
    pub rules: Vec<MatchRule>,
    /// Threshold for [`MatchRule::TokenOverlap`], in `0.0..=1.0`.
    pub token_overlap_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULE_ORDER.to_vec(),
            token_overlap_threshold: DEFAULT_TOKEN_OVERLAP_THRESHOLD,
        }
    }
}

impl MatcherConfig {
    /// Set the token-overlap threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.token_overlap_threshold = threshold;
        self
    }

    /// Replace the rule order.
    #[must_use]
    pub fn with_rules(mut self, rules: impl Into<Vec<MatchRule>>) -> Self {
        self.rules = rules.into();
        self
    }
}

struct KeyPair<'a> {
    a: &'a NormalizedKey,
    b: &'a NormalizedKey,
}

/// Decides whether two free-text titles denote the same course.
#[derive(Clone, Debug, Default)]
pub struct TitleMatcher {
    aliases: AliasTable,
    config: MatcherConfig,
}

impl TitleMatcher {
    /// Create a matcher with a custom alias table and configuration.
    #[must_use]
    pub const fn new(aliases: AliasTable, config: MatcherConfig) -> Self {
        Self { aliases, config }
    }

    /// Borrow the configuration.
    #[must_use]
    pub const fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Whether the two titles match.
    #[must_use]
    pub fn matches(&self, a: &str, b: &str) -> bool {
        self.explain(a, b).is_some()
    }

    /// The first rule that matched, or `None`.
    ///
    /// Titles that normalize to nothing never match anything, including
    /// each other.
    #[must_use]
    pub fn explain(&self, a: &str, b: &str) -> Option<MatchRule> {
        let key_a = normalize_key(a);
        let key_b = normalize_key(b);
        decide(&key_a, &key_b, &self.aliases, &self.config)
    }

    /// First candidate in `candidates` that matches `title`.
    #[must_use]
    pub fn find_match<'c, S: AsRef<str>>(&self, title: &str, candidates: &'c [S]) -> Option<&'c S> {
        let key = normalize_key(title);
        if key.is_empty() {
            return None;
        }
        candidates.iter().find(|candidate| {
            let other = normalize_key(candidate.as_ref());
            decide(&key, &other, &self.aliases, &self.config).is_some()
        })
    }
}

fn decide(
    a: &NormalizedKey,
    b: &NormalizedKey,
    aliases: &AliasTable,
    config: &MatcherConfig,
) -> Option<MatchRule> {
    if a.is_empty() || b.is_empty() {
        return None;
    }

    let pair = KeyPair { a, b };
    config
        .rules
        .iter()
        .copied()
        .find(|rule| rule.applies(&pair, aliases, config.token_overlap_threshold))
}

fn contains_either(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

fn alias_match(pair: &KeyPair<'_>, aliases: &AliasTable) -> bool {
    let variants_a = aliases.expand(pair.a.as_str());
    let variants_b = aliases.expand(pair.b.as_str());

    variants_a
        .iter()
        .any(|va| variants_b.iter().any(|vb| contains_either(va, vb)))
}

/// Shared tokens divided by the size of the smaller token set.
///
/// Returns `0.0` when either key has no tokens.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn token_overlap(a: &NormalizedKey, b: &NormalizedKey) -> f64 {
    let tokens_a: BTreeSet<&str> = a.tokens();
    let tokens_b: BTreeSet<&str> = b.tokens();
    let min_size = tokens_a.len().min(tokens_b.len());
    if min_size == 0 {
        return 0.0;
    }

    let overlap = tokens_a.intersection(&tokens_b).count();
    overlap as f64 / min_size as f64
}

/// Match two titles with the default alias table and configuration.
#[must_use]
pub fn titles_match(a: &str, b: &str) -> bool {
    decide(
        &normalize_key(a),
        &normalize_key(b),
        default_table(),
        &MatcherConfig::default(),
    )
    .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn explain(a: &str, b: &str) -> Option<MatchRule> {
        TitleMatcher::default().explain(a, b)
    }

    #[test]
    fn test_exact_after_normalization() {
        assert_eq!(explain("Abrasive Wheels:", "abrasive  wheels"), Some(MatchRule::Exact));
    }

    #[test]
    fn test_token_overlap_full_subset() {
        // "fire safety" is also a substring, so the cheaper rule decides.
        assert!(titles_match("Fire Safety Awareness", "Fire Safety"));
        assert_eq!(
            explain("Fire Safety Awareness", "Fire Safety"),
            Some(MatchRule::Substring)
        );
    }

    #[test]
    fn test_substring_before_token_overlap() {
        assert_eq!(
            explain("Fire Safety Awareness Training", "Awareness"),
            Some(MatchRule::Substring)
        );
    }

    #[test]
    fn test_alias_food_hygiene() {
        assert!(titles_match("Food Hygiene", "Food Safety"));
        assert_eq!(explain("Food Hygiene", "Food Safety"), Some(MatchRule::Alias));
    }

    #[test]
    fn test_alias_dse() {
        assert_eq!(
            explain("DSE Assessment", "Display Screen Equipment Assessment"),
            Some(MatchRule::Alias)
        );
    }

    #[test]
    fn test_token_overlap_rule() {
        // 2 of 3 shared tokens: 0.67 >= 0.6
        assert_eq!(
            explain("Working at Heights", "Heights Working Safely"),
            Some(MatchRule::TokenOverlap)
        );
    }

    #[test]
    fn test_token_overlap_below_threshold() {
        // 1 of 2: 0.5 < 0.6
        assert!(!titles_match("Manual Handling", "Manual Tasks"));
    }

    #[test]
    fn test_no_match() {
        assert!(!titles_match("Abrasive Wheels", "Manual Handling"));
    }

    #[test]
    fn test_empty_titles_never_match() {
        assert!(!titles_match("", ""));
        assert!(!titles_match("", "Fire Safety"));
        assert!(!titles_match("???", "!!!"));
        assert_eq!(explain("", ""), None);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let strict = TitleMatcher::new(
            AliasTable::seed(),
            MatcherConfig::default().with_threshold(0.9),
        );
        assert!(!strict.matches("Working at Heights", "Heights Working Safely"));
    }

    #[test]
    fn test_rule_order_is_configurable() {
        let token_first = TitleMatcher::new(
            AliasTable::seed(),
            MatcherConfig::default().with_rules([MatchRule::TokenOverlap, MatchRule::Exact]),
        );
        assert_eq!(
            token_first.explain("Fire Safety", "fire safety"),
            Some(MatchRule::TokenOverlap)
        );
        assert!(!token_first.matches("Food Hygiene", "Food Safety"));
    }

    #[test]
    fn test_without_aliases() {
        let plain = TitleMatcher::new(AliasTable::empty(), MatcherConfig::default());
        assert!(!plain.matches("Food Hygiene", "Food Safety"));
    }

    #[test]
    fn test_find_match() {
        let matcher = TitleMatcher::default();
        let candidates = ["Manual Handling", "Food Safety Level 2", "Fire Marshal"];
        assert_eq!(
            matcher.find_match("Food Hygiene Level 2", &candidates),
            Some(&"Food Safety Level 2")
        );
        assert_eq!(matcher.find_match("", &candidates), None);
        assert_eq!(matcher.find_match("Legionella", &candidates), None);
    }

    #[test]
    fn test_token_overlap_value() {
        let a = normalize_key("Fire Safety Awareness");
        let b = normalize_key("Fire Safety");
        assert!((token_overlap(&a, &b) - 1.0).abs() < f64::EPSILON);
        assert!(token_overlap(&a, &normalize_key("")).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_serde() {
        let json = serde_json::to_string(&MatcherConfig::default()).unwrap();
        assert!(json.contains("token_overlap"));
        let back: MatcherConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MatcherConfig::default());
    }

    proptest! {
        #[test]
        fn prop_symmetric(a in "[a-zA-Z &:-]{0,30}", b in "[a-zA-Z &:-]{0,30}") {
            prop_assert_eq!(titles_match(&a, &b), titles_match(&b, &a));
        }

        #[test]
        fn prop_symmetric_with_aliases(
            a in "(dse|food hygiene|food safety|h&s|first aid|fire) ?[a-z]{0,8}",
            b in "(display screen equipment|food safety|health and safety|emergency first aid) ?[a-z]{0,8}",
        ) {
            prop_assert_eq!(titles_match(&a, &b), titles_match(&b, &a));
        }
    }
}
