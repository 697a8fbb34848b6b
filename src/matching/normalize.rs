//! Title normalization: comparison keys and URL slugs.
//!
//! Both functions are total. Any string, including the empty string,
//! yields a valid (possibly empty) output, and both are idempotent.

use std::collections::BTreeSet;
use std::fmt;
use std::iter;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonical comparison form of a course title.
///
/// Lowercase, only word characters, `-`, `&` and single interior spaces.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    /// Borrow the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key carries no characters at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whitespace-delimited words of the key.
    #[must_use]
    pub fn tokens(&self) -> BTreeSet<&str> {
        self.0.split(' ').filter(|t| !t.is_empty()).collect()
    }

    /// Consume the key and return the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for NormalizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// URL-path-safe identifier derived from a title.
///
/// Only lowercase alphanumeric characters and single interior hyphens.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
#[serde(into = "String")]
pub struct Slug(String);

impl Slug {
    /// Borrow the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the title produced no slug characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append an identifier suffix (`abrasive-wheels` → `abrasive-wheels-26`).
    #[must_use]
    pub fn with_suffix(&self, suffix: impl fmt::Display) -> Self {
        if self.0.is_empty() {
            slugify(&suffix.to_string())
        } else {
            slugify(&format!("{}-{suffix}", self.0))
        }
    }
}

// Stored slugs are re-slugified on the way in; valid slugs pass through unchanged.
impl From<String> for Slug {
    fn from(value: String) -> Self {
        slugify(&value)
    }
}

impl From<Slug> for String {
    fn from(value: Slug) -> Self {
        value.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const fn is_key_char(ch: char) -> bool {
    ch == '_' || ch == '-' || ch == '&'
}

// Characters that lowercasing or NFKD would still change are dropped, so a
// slug is a fixed point of `slugify`.
fn is_slug_char(ch: char) -> bool {
    ch.is_alphanumeric()
        && !is_combining_mark(ch)
        && ch.to_lowercase().eq(iter::once(ch))
        && iter::once(ch).nfkd().eq(iter::once(ch))
}

/// Normalize a raw title into its comparison key.
///
/// Lowercases, drops everything except word characters, whitespace, `-`
/// and `&`, then collapses whitespace runs into single spaces with no
/// space at either edge.
#[must_use]
pub fn normalize_key(title: &str) -> NormalizedKey {
    let mut key = String::with_capacity(title.len());
    let mut pending_space = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() {
            pending_space = !key.is_empty();
        } else if ch.is_alphanumeric() || is_key_char(ch) {
            if pending_space {
                key.push(' ');
                pending_space = false;
            }
            key.push(ch);
        }
    }

    NormalizedKey(key)
}

/// Convert a raw title into a URL slug.
///
/// Runs of whitespace, `_` and `-` become a single hyphen, accents are
/// folded (`é` → `e`), every other non-alphanumeric character is dropped,
/// and hyphens never lead or trail. Letters without a decomposition stay
/// as they are (`Straße` → `straße`).
#[must_use]
pub fn slugify(title: &str) -> Slug {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    let folded = title
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase);

    for ch in folded {
        if is_slug_char(ch) {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_hyphen = true;
        }
    }

    Slug(slug)
}
