//! Pushes scraped courses and descriptions into a course store.
//!
//! Failures on one course are logged and counted; the remaining courses
//! are still processed.

use serde::Serialize;

use crate::matching::{CourseId, CourseIdentity};
use crate::scraping::{ScrapedCourse, StaticDescription};
use crate::store::{CourseStore, StoreResult};

/// Outcome of [`persist`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Courses upserted.
    pub saved: usize,
    /// Assets written across all saved courses.
    pub assets_saved: usize,
    /// Courses whose upsert or asset replacement failed.
    pub failed: Vec<CourseId>,
}

impl SyncSummary {
    /// Whether every course was written.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of [`apply_descriptions`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DescriptionSummary {
    /// Descriptions written.
    pub updated: usize,
    /// Ids with no stored course.
    pub not_found: Vec<CourseId>,
    /// Ids whose update failed.
    pub failed: Vec<CourseId>,
}

/// How many stored courses carry a description.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DescriptionCoverage {
    /// Stored courses.
    pub total: usize,
    /// Courses with a non-blank description.
    pub with_description: usize,
    /// Courses with no description or a blank one, in id order.
    pub missing: Vec<CourseIdentity>,
}

/// Upsert every course, then replace its assets.
pub async fn persist<S>(store: &S, courses: &[ScrapedCourse]) -> SyncSummary
where
    S: CourseStore + ?Sized,
{
    let mut summary = SyncSummary::default();

    for course in courses {
        if let Err(e) = store.upsert_course(course).await {
            tracing::warn!("Failed to save course {} ({}): {e}", course.id, course.title);
            summary.failed.push(course.id);
            continue;
        }

        if let Err(e) = store.replace_assets(course.id, &course.assets).await {
            tracing::warn!("Failed to save assets for course {}: {e}", course.id);
            summary.failed.push(course.id);
            continue;
        }

        tracing::debug!("Saved course {}: {}", course.id, course.title);
        summary.saved += 1;
        summary.assets_saved += course.assets.len();
    }

    tracing::info!(
        "Saved {}/{} courses ({} assets)",
        summary.saved,
        courses.len(),
        summary.assets_saved
    );
    summary
}

/// Write static-export descriptions onto already stored courses.
pub async fn apply_descriptions<S>(
    store: &S,
    descriptions: &[StaticDescription],
) -> DescriptionSummary
where
    S: CourseStore + ?Sized,
{
    let mut summary = DescriptionSummary::default();

    for entry in descriptions {
        match store.update_description(entry.id, &entry.description).await {
            Ok(true) => {
                tracing::debug!("Updated description for {}: {}", entry.id, entry.title);
                summary.updated += 1;
            }
            Ok(false) => {
                tracing::warn!("No stored course {} for {:?}", entry.id, entry.title);
                summary.not_found.push(entry.id);
            }
            Err(e) => {
                tracing::warn!("Failed to update course {}: {e}", entry.id);
                summary.failed.push(entry.id);
            }
        }
    }

    tracing::info!(
        "Updated {}/{} course descriptions",
        summary.updated,
        descriptions.len()
    );
    summary
}

/// Count stored courses with and without a description.
///
/// A blank description counts as missing.
///
/// # Errors
/// Returns an error if the courses cannot be listed.
pub async fn description_coverage<S>(store: &S) -> StoreResult<DescriptionCoverage>
where
    S: CourseStore + ?Sized,
{
    let courses = store.list_courses().await?;

    let missing: Vec<CourseIdentity> = courses
        .iter()
        .filter(|c| c.description.as_deref().is_none_or(|d| d.trim().is_empty()))
        .map(|c| CourseIdentity::new(c.id, c.title.clone()))
        .collect();

    tracing::debug!("{} of {} courses lack a description", missing.len(), courses.len());
    Ok(DescriptionCoverage {
        total: courses.len(),
        with_description: courses.len() - missing.len(),
        missing,
    })
}
