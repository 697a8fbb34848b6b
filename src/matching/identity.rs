//! Duplicate and collision detection over `(id, title)` listings.
//!
//! Every report is a `BTreeMap`, so iteration order is stable for a fixed
//! input (sorted by id or by slug).

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::matching::normalize::{Slug, slugify};

/// Upstream course identifier (the `nid` query parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct CourseId(pub u32);

impl CourseId {
    /// Borrow the raw number.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CourseId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u32> for CourseId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A course id paired with the title it was listed under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseIdentity {
    /// Upstream id.
    pub id: CourseId,
    /// Title as scraped.
    pub title: String,
}

impl CourseIdentity {
    /// Create a new identity.
    #[must_use]
    pub fn new(id: impl Into<CourseId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Slug of the title, without any id suffix.
    #[must_use]
    pub fn slug(&self) -> Slug {
        slugify(&self.title)
    }
}

/// How final slugs are made unique.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugPolicy {
    /// Every slug carries its id (`fire-safety-31`).
    #[default]
    AlwaysSuffix,
    /// Only colliding or empty slugs carry their id.
    SuffixOnCollision,
}

/// Groups of records sharing an id; only groups larger than one.
#[must_use]
pub fn find_duplicate_ids(records: &[CourseIdentity]) -> BTreeMap<CourseId, Vec<CourseIdentity>> {
    let mut groups: BTreeMap<CourseId, Vec<CourseIdentity>> = BTreeMap::new();
    for record in records {
        groups.entry(record.id).or_default().push(record.clone());
    }
    groups.retain(|_, group| group.len() > 1);
    groups
}

/// Keep the first record per id, preserving input order.
#[must_use]
pub fn dedupe_by_id(records: &[CourseIdentity]) -> Vec<CourseIdentity> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| seen.insert(record.id))
        .cloned()
        .collect()
}

/// Slugs produced by more than one distinct id.
///
/// Records are deduplicated by id first (first occurrence wins), so a
/// course listed twice never collides with itself.
#[must_use]
pub fn find_slug_collisions(records: &[CourseIdentity]) -> BTreeMap<Slug, Vec<CourseIdentity>> {
    let mut groups = group_by_slug(&dedupe_by_id(records));
    groups.retain(|_, group| {
        group.iter().map(|r| r.id).collect::<BTreeSet<_>>().len() > 1
    });
    groups
}

/// Slugs appearing more than once in the raw listing, ids not deduplicated.
#[must_use]
pub fn find_duplicate_slugs(records: &[CourseIdentity]) -> BTreeMap<Slug, Vec<CourseIdentity>> {
    let mut groups = group_by_slug(records);
    groups.retain(|_, group| group.len() > 1);
    groups
}

fn group_by_slug(records: &[CourseIdentity]) -> BTreeMap<Slug, Vec<CourseIdentity>> {
    let mut groups: BTreeMap<Slug, Vec<CourseIdentity>> = BTreeMap::new();
    for record in records {
        groups.entry(record.slug()).or_default().push(record.clone());
    }
    groups
}

/// Slug with the id appended; `course-{id}` when the title has no slug.
#[must_use]
pub fn disambiguated_slug(title: &str, id: CourseId) -> Slug {
    let base = slugify(title);
    if base.is_empty() {
        slugify(&format!("course-{id}"))
    } else {
        base.with_suffix(id)
    }
}

/// Final slug per id under the given policy.
///
/// Records are deduplicated by id first; the result is keyed by id.
#[must_use]
pub fn assign_slugs(records: &[CourseIdentity], policy: SlugPolicy) -> BTreeMap<CourseId, Slug> {
    let unique = dedupe_by_id(records);
    match policy {
        SlugPolicy::AlwaysSuffix => unique
            .iter()
            .map(|r| (r.id, disambiguated_slug(&r.title, r.id)))
            .collect(),
        SlugPolicy::SuffixOnCollision => {
            let collisions = find_slug_collisions(&unique);
            unique
                .iter()
                .map(|r| {
                    let slug = r.slug();
                    if slug.is_empty() || collisions.contains_key(&slug) {
                        (r.id, disambiguated_slug(&r.title, r.id))
                    } else {
                        (r.id, slug)
                    }
                })
                .collect()
        }
    }
}
