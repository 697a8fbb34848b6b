//! Deterministic asset URLs derived from a course id.

use crate::matching::CourseId;
use crate::scraping::types::{AssetKind, CourseAsset, ScrapedCourse};

/// Course icon URL.
#[must_use]
pub fn icon_url(host: &str, id: CourseId) -> String {
    format!("{host}/common/course-icons/course{id}.png")
}

/// Promotional video embed URL.
#[must_use]
pub fn video_url(host: &str, id: CourseId) -> String {
    format!("{host}/embed/{id}")
}

/// Course information sheet URL.
#[must_use]
pub fn pdf_url(host: &str, id: CourseId) -> String {
    format!("{host}/common/courses/info_{id}.pdf")
}

/// The video and PDF assets every course has.
#[must_use]
pub fn assets_for(host: &str, id: CourseId, title: &str) -> Vec<CourseAsset> {
    vec![
        CourseAsset {
            kind: AssetKind::Video,
            url: video_url(host, id),
            label: format!("{title} - Promotional Video"),
        },
        CourseAsset {
            kind: AssetKind::Pdf,
            url: pdf_url(host, id),
            label: format!("{title} - Course Information"),
        },
    ]
}

/// Fill in icon URLs and assets for every course.
pub fn attach_assets(host: &str, courses: &mut [ScrapedCourse]) {
    for course in courses.iter_mut() {
        course.icon_url = Some(icon_url(host, course.id));
        course.assets = assets_for(host, course.id, &course.title);
    }
    tracing::debug!("Constructed icons and assets for {} courses", courses.len());
}
