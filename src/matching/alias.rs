//! Alias expansion for known abbreviations and synonyms.
//!
//! The table is plain data: adding an alias never touches matching logic.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::normalize::{NormalizedKey, normalize_key};

/// Seed aliases as `(short, expanded)` pairs.
pub const SEED_ALIASES: &[(&str, &str)] = &[
    ("dse", "display screen equipment"),
    ("display screen equipment", "assessing display screen equipment"),
    ("nvq", "nvq"),
    ("food hygiene", "food safety"),
    ("cyber security", "cybersecurity"),
    ("h&s", "health and safety"),
    ("mental health", "mental health awareness"),
    ("first aid", "emergency first aid"),
];

static DEFAULT_TABLE: LazyLock<AliasTable> = LazyLock::new(AliasTable::seed);

/// Errors raised while building an alias table.
#[derive(Debug, Error)]
pub enum AliasError {
    /// An entry normalizes to an empty string.
    #[error("alias entry {index} has an empty side")]
    EmptyEntry {
        /// Position of the offending entry.
        index: usize,
    },
    /// The alias file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The alias file is not valid JSON.
    #[error("alias file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single synonym pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasPair {
    /// Abbreviated or canonical short form.
    pub short: String,
    /// Expanded or alternative form.
    pub expanded: String,
}

/// Immutable synonym table used to widen title matching.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AliasTable {
    pairs: Vec<AliasPair>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::seed()
    }
}

impl AliasTable {
    /// Build a table from pairs.
    ///
    /// Both sides are normalized the same way titles are, so entries like
    /// `"H&S"` match the keys they will be compared against.
    ///
    /// # Errors
    /// Returns an error if either side of a pair normalizes to nothing.
    pub fn new(pairs: impl IntoIterator<Item = AliasPair>) -> Result<Self, AliasError> {
        let mut normalized = Vec::new();
        for (index, pair) in pairs.into_iter().enumerate() {
            let short = normalize_key(&pair.short).into_string();
            let expanded = normalize_key(&pair.expanded).into_string();
            if short.is_empty() || expanded.is_empty() {
                return Err(AliasError::EmptyEntry { index });
            }
            normalized.push(AliasPair { short, expanded });
        }
        Ok(Self { pairs: normalized })
    }

    /// The built-in course-catalog aliases.
    #[must_use]
    pub fn seed() -> Self {
        Self {
            pairs: SEED_ALIASES
                .iter()
                .map(|(short, expanded)| AliasPair {
                    short: (*short).to_string(),
                    expanded: (*expanded).to_string(),
                })
                .collect(),
        }
    }

    /// An empty table; expansion then only yields the key itself.
    #[must_use]
    pub const fn empty() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Parse a JSON array of `{"short": .., "expanded": ..}` objects.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or an entry is empty.
    pub fn from_json(json: &str) -> Result<Self, AliasError> {
        let pairs: Vec<AliasPair> = serde_json::from_str(json)?;
        Self::new(pairs)
    }

    /// Load a JSON alias file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, AliasError> {
        let json = std::fs::read_to_string(path)?;
        let table = Self::from_json(&json)?;
        tracing::debug!("Loaded {} aliases from {}", table.len(), path.display());
        Ok(table)
    }

    /// Table with an extra pair appended.
    ///
    /// # Errors
    /// Returns an error if the pair normalizes to nothing.
    pub fn with_pair(self, short: &str, expanded: &str) -> Result<Self, AliasError> {
        let mut pairs = self.pairs;
        pairs.push(AliasPair {
            short: short.to_string(),
            expanded: expanded.to_string(),
        });
        Self::new(pairs)
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the table has no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate the pairs in declaration order.
    pub fn pairs(&self) -> impl Iterator<Item = &AliasPair> {
        self.pairs.iter()
    }

    /// Expand a key into itself plus one variant per applicable pair.
    ///
    /// A pair applies in either direction: `short` inside the key yields the
    /// key with `short` replaced by `expanded`, and vice versa.
    #[must_use]
    pub fn expand(&self, key: &str) -> BTreeSet<String> {
        let mut variants = BTreeSet::new();
        variants.insert(key.to_string());

        for pair in &self.pairs {
            if key.contains(pair.short.as_str()) {
                variants.insert(key.replace(pair.short.as_str(), &pair.expanded));
            }
            if key.contains(pair.expanded.as_str()) {
                variants.insert(key.replace(pair.expanded.as_str(), &pair.short));
            }
        }

        variants
    }
}

/// The process-wide default table.
#[must_use]
pub fn default_table() -> &'static AliasTable {
    &DEFAULT_TABLE
}

/// Expand a normalized key using the default table.
#[must_use]
pub fn expand_aliases(key: &NormalizedKey) -> BTreeSet<String> {
    DEFAULT_TABLE.expand(key.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_includes_key() {
        let key = normalize_key("Manual Handling");
        let variants = expand_aliases(&key);
        assert_eq!(variants.len(), 1);
        assert!(variants.contains("manual handling"));
    }

    #[test]
    fn test_expand_dse_round_trip() {
        let key = normalize_key("DSE Assessment");
        let variants = expand_aliases(&key);
        assert!(variants.contains("dse assessment"));
        assert!(variants.iter().any(|v| v.contains("display screen equipment")));
    }

    #[test]
    fn test_expand_reverse_direction() {
        let variants = expand_aliases(&normalize_key("Food Safety Level 2"));
        assert!(variants.contains("food hygiene level 2"));
    }

    #[test]
    fn test_expand_ampersand_alias() {
        let variants = expand_aliases(&normalize_key("H&S for Managers"));
        assert!(variants.contains("health and safety for managers"));
    }

    #[test]
    fn test_identity_alias_collapses() {
        let variants = expand_aliases(&normalize_key("NVQ Level 3"));
        assert_eq!(variants.len(), 1);
    }

    #[test]
    fn test_custom_table_from_json() {
        let table = AliasTable::from_json(
            r#"[{"short": "COSHH", "expanded": "Control of Substances Hazardous to Health"}]"#,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        let variants = table.expand("coshh awareness");
        assert!(variants.contains("control of substances hazardous to health awareness"));
    }

    #[test]
    fn test_empty_entry_rejected() {
        let err = AliasTable::empty().with_pair("???", "something").unwrap_err();
        assert!(matches!(err, AliasError::EmptyEntry { index: 0 }));
    }

    #[test]
    fn test_empty_table_only_identity() {
        let table = AliasTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.expand("dse").len(), 1);
    }

    #[test]
    fn test_seed_is_default() {
        assert_eq!(default_table(), &AliasTable::default());
        assert_eq!(default_table().len(), SEED_ALIASES.len());
    }
}
