//! Core types for scraping results.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matching::{CourseId, Slug};

/// Course suite on the upstream site.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Suite 1.
    HealthAndSafety,
    /// Suite 2.
    BusinessSkills,
    /// Suite 3.
    HealthAndSocialCare,
    /// Suite 4.
    MentalHealthAndWellbeing,
    /// Suite 5.
    Hospitality,
}

impl Category {
    /// All suites in upstream order.
    pub const ALL: [Self; 5] = [
        Self::HealthAndSafety,
        Self::BusinessSkills,
        Self::HealthAndSocialCare,
        Self::MentalHealthAndWellbeing,
        Self::Hospitality,
    ];

    /// Display name, exactly as the site prints it.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HealthAndSafety => "Health & Safety",
            Self::BusinessSkills => "Business Skills",
            Self::HealthAndSocialCare => "Health & Social Care",
            Self::MentalHealthAndWellbeing => "Mental Health & Wellbeing",
            Self::Hospitality => "Hospitality",
        }
    }

    /// Upstream suite id.
    #[must_use]
    pub const fn suite_id(self) -> u8 {
        match self {
            Self::HealthAndSafety => 1,
            Self::BusinessSkills => 2,
            Self::HealthAndSocialCare => 3,
            Self::MentalHealthAndWellbeing => 4,
            Self::Hospitality => 5,
        }
    }

    /// Suite for an upstream id.
    #[must_use]
    pub fn from_suite_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.suite_id() == id)
    }

    /// First suite whose name occurs in `text` (case-insensitive).
    #[must_use]
    pub fn detect(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| lower.contains(&c.name().to_lowercase()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown category: {trimmed}"))
    }
}

/// Kind of downloadable asset attached to a course.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Promotional video embed.
    Video,
    /// Course information sheet.
    Pdf,
}

impl AssetKind {
    /// Stable storage identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(Self::Video),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown asset kind: {other}")),
        }
    }
}

/// A downloadable asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseAsset {
    /// Asset kind.
    pub kind: AssetKind,
    /// Absolute URL.
    pub url: String,
    /// Human-readable label.
    pub label: String,
}

/// One course as scraped from the admin page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedCourse {
    /// Upstream id.
    pub id: CourseId,
    /// Title with trailing colon removed.
    pub title: String,
    /// Final, unique slug.
    pub slug: Slug,
    /// Suite the course was listed under.
    pub category: Option<Category>,
    /// Absolute purchase link.
    pub purchase_url: Option<String>,
    /// Absolute free-trial link.
    pub free_trial_url: Option<String>,
    /// Course icon.
    pub icon_url: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Downloadable assets.
    pub assets: Vec<CourseAsset>,
}

/// A description block from a static HTML export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticDescription {
    /// Id recovered from the icon or purchase link.
    pub id: CourseId,
    /// Heading text.
    pub title: String,
    /// Description text (continuation paragraphs joined by a space).
    pub description: String,
}

/// Coverage counters for a scrape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeStats {
    /// Unique courses.
    pub total_courses: usize,
    /// Courses with an icon URL.
    pub with_icons: usize,
    /// Courses with a description.
    pub with_descriptions: usize,
    /// Courses with a purchase URL.
    pub with_purchase_urls: usize,
    /// Courses with a free-trial URL.
    pub with_trial_urls: usize,
    /// Courses with at least one asset.
    pub with_assets: usize,
    /// Assets across all courses.
    pub total_assets: usize,
}

impl ScrapeStats {
    /// Count coverage over a course list.
    #[must_use]
    pub fn from_courses(courses: &[ScrapedCourse]) -> Self {
        Self {
            total_courses: courses.len(),
            with_icons: courses.iter().filter(|c| c.icon_url.is_some()).count(),
            with_descriptions: courses.iter().filter(|c| c.description.is_some()).count(),
            with_purchase_urls: courses.iter().filter(|c| c.purchase_url.is_some()).count(),
            with_trial_urls: courses.iter().filter(|c| c.free_trial_url.is_some()).count(),
            with_assets: courses.iter().filter(|c| !c.assets.is_empty()).count(),
            total_assets: courses.iter().map(|c| c.assets.len()).sum(),
        }
    }
}

/// Result of a full scrape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScrapeReport {
    /// Courses, in listing order.
    pub courses: Vec<ScrapedCourse>,
    /// Coverage counters.
    pub stats: ScrapeStats,
    /// When the page was scraped.
    pub scraped_at: DateTime<Utc>,
}

impl ScrapeReport {
    /// Build a report, computing stats from the courses.
    #[must_use]
    pub fn new(courses: Vec<ScrapedCourse>) -> Self {
        let stats = ScrapeStats::from_courses(&courses);
        Self {
            courses,
            stats,
            scraped_at: Utc::now(),
        }
    }

    /// Courses lacking a purchase URL, for strict mode.
    #[must_use]
    pub fn missing_purchase_urls(&self) -> Vec<CourseId> {
        self.courses
            .iter()
            .filter(|c| c.purchase_url.as_deref().is_none_or(str::is_empty))
            .map(|c| c.id)
            .collect()
    }
}
