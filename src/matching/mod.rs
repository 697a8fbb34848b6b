//! Pure title-matching core.
//!
//! - `normalize`: comparison keys and URL slugs
//! - `alias`: data-driven synonym expansion
//! - `matcher`: ordered rule cascade deciding whether two titles match
//! - `identity`: duplicate-id, duplicate-slug and slug-collision reports
//!
//! Nothing here performs I/O or holds mutable state; every function is
//! safe to call from any thread.

pub mod alias;
pub mod identity;
pub mod matcher;
pub mod normalize;

pub use alias::{AliasError, AliasPair, AliasTable, expand_aliases};
pub use identity::{
    CourseId, CourseIdentity, SlugPolicy, assign_slugs, dedupe_by_id, disambiguated_slug,
    find_duplicate_ids, find_duplicate_slugs, find_slug_collisions,
};
pub use matcher::{
    DEFAULT_RULE_ORDER, DEFAULT_TOKEN_OVERLAP_THRESHOLD, MatchRule, MatcherConfig, TitleMatcher,
    titles_match,
};
pub use normalize::{NormalizedKey, Slug, normalize_key, slugify};
