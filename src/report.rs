//! Plain-text reports printed by the CLI.

use std::collections::BTreeMap;
use std::fmt;

use crate::matching::{CourseId, CourseIdentity, Slug};
use crate::scraping::ScrapeReport;
use crate::sync::DescriptionCoverage;

const RULE: &str = "============================================================";
const SAMPLE_COURSES: usize = 5;

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, total: usize) -> f64 {
    part as f64 / total.max(1) as f64 * 100.0
}

const fn mark(present: bool) -> &'static str {
    if present { "yes" } else { "no" }
}

/// Ids listed more than once, with every title they appeared under.
pub struct DuplicateIdReport<'a> {
    /// Groups from [`crate::matching::find_duplicate_ids`].
    pub groups: &'a BTreeMap<CourseId, Vec<CourseIdentity>>,
}

impl fmt::Display for DuplicateIdReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups.is_empty() {
            return writeln!(f, "No duplicate course IDs found!");
        }

        writeln!(f, "{RULE}")?;
        writeln!(f, "FOUND {} DUPLICATE COURSE IDS", self.groups.len())?;
        writeln!(f, "{RULE}")?;
        for (id, records) in self.groups {
            writeln!(f)?;
            writeln!(f, "ID {id} ({} occurrences)", records.len())?;
            for record in records {
                writeln!(f, "  - \"{}\"", record.title)?;
            }
        }
        Ok(())
    }
}

/// Slugs shared by several records.
///
/// With `distinct_ids` set the heading describes collisions between
/// different courses; otherwise every repeated slug is listed.
pub struct SlugReport<'a> {
    /// Groups from [`crate::matching::find_slug_collisions`] or
    /// [`crate::matching::find_duplicate_slugs`].
    pub groups: &'a BTreeMap<Slug, Vec<CourseIdentity>>,
    /// Whether the groups only hold distinct ids.
    pub distinct_ids: bool,
}

impl fmt::Display for SlugReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups.is_empty() {
            if self.distinct_ids {
                writeln!(f, "No slug collisions found!")?;
                return writeln!(f, "All unique courses have unique slugs.");
            }
            return writeln!(f, "No duplicate slugs found!");
        }

        writeln!(f, "{RULE}")?;
        if self.distinct_ids {
            writeln!(f, "FOUND {} SLUG COLLISIONS", self.groups.len())?;
            writeln!(f, "(Different course IDs producing the same slug)")?;
        } else {
            writeln!(f, "FOUND {} DUPLICATE SLUGS", self.groups.len())?;
        }
        writeln!(f, "{RULE}")?;

        for (slug, records) in self.groups {
            writeln!(f)?;
            writeln!(f, "Slug: '{slug}' ({} occurrences)", records.len())?;
            for record in records {
                writeln!(f, "  - ID {}: \"{}\"", record.id, record.title)?;
            }
        }
        Ok(())
    }
}

/// Coverage summary of a scrape, with sample courses in dry-run mode.
pub struct ScrapeSummary<'a> {
    /// The scrape to summarize.
    pub report: &'a ScrapeReport,
    /// Whether nothing was written to the store.
    pub dry_run: bool,
}

impl fmt::Display for ScrapeSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.report.stats;
        let total = stats.total_courses;

        writeln!(f, "{RULE}")?;
        writeln!(f, "SCRAPING SUMMARY")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Total courses:        {total}")?;
        for (label, count) in [
            ("With icons:", stats.with_icons),
            ("With descriptions:", stats.with_descriptions),
            ("With purchase URLs:", stats.with_purchase_urls),
            ("With free trial URLs:", stats.with_trial_urls),
        ] {
            writeln!(f, "{label:<22}{count} ({:.1}%)", percent(count, total))?;
        }
        writeln!(f, "With assets:          {} courses", stats.with_assets)?;
        writeln!(f, "Total assets:         {} (videos + PDFs)", stats.total_assets)?;

        if self.dry_run {
            writeln!(f)?;
            writeln!(f, "[DRY RUN MODE] No data written to database")?;
            writeln!(f)?;
            writeln!(f, "Sample courses:")?;
            for course in self.report.courses.iter().take(SAMPLE_COURSES) {
                writeln!(f)?;
                writeln!(f, "  ID: {}", course.id)?;
                writeln!(f, "  Title: {}", course.title)?;
                writeln!(f, "  Slug: {}", course.slug)?;
                match course.category {
                    Some(category) => writeln!(f, "  Category: {category}")?,
                    None => writeln!(f, "  Category: -")?,
                }
                writeln!(f, "  Icon: {}", mark(course.icon_url.is_some()))?;
                writeln!(f, "  Description: {}", mark(course.description.is_some()))?;
                writeln!(f, "  Assets: {}", course.assets.len())?;
            }
        }

        write!(f, "{RULE}")
    }
}

/// Description coverage of the stored catalog.
pub struct CoverageReport<'a> {
    /// Counts from [`crate::sync::description_coverage`].
    pub coverage: &'a DescriptionCoverage,
}

impl fmt::Display for CoverageReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let coverage = self.coverage;
        let missing = coverage.missing.len();

        writeln!(f, "{RULE}")?;
        writeln!(f, "DESCRIPTION COVERAGE REPORT")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Total courses: {}", coverage.total)?;
        writeln!(
            f,
            "With descriptions: {} ({:.1}%)",
            coverage.with_description,
            percent(coverage.with_description, coverage.total)
        )?;
        writeln!(
            f,
            "Without descriptions: {missing} ({:.1}%)",
            percent(missing, coverage.total)
        )?;

        if missing > 0 {
            writeln!(f)?;
            writeln!(f, "Courses missing descriptions:")?;
            for course in &coverage.missing {
                writeln!(f, "  - ID {}: {}", course.id, course.title)?;
            }
        }

        write!(f, "{RULE}")
    }
}
