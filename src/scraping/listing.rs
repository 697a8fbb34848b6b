//! Course listing extraction from the admin page.
//!
//! The page groups courses under suite headings. Each course is a
//! `p.webContent_courseName` paragraph followed by a `ul` holding its
//! purchase link (`purchaseCourse.php?nid=<id>`) and, optionally, a
//! free-trial link.

use scraper::{ElementRef, Html};
use url::Url;

use crate::matching::{CourseId, CourseIdentity, SlugPolicy, assign_slugs, dedupe_by_id};
use crate::scraping::error::ScrapingError;
use crate::scraping::html::{
    element_text, has_class, next_element_siblings, query_param, resolve_url, selector,
};
use crate::scraping::types::{Category, ScrapedCourse};

const COURSE_NAME_CLASS: &str = "webContent_courseName";
const PURCHASE_PAGE: &str = "purchaseCourse.php";
const TRIAL_PAGE: &str = "freeTrial.php";
const MAX_HEADING_CHARS: usize = 100;

/// One course paragraph as it appears on the page, before deduplication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingEntry {
    /// Id and title.
    pub identity: CourseIdentity,
    /// Suite heading the entry appeared under.
    pub category: Option<Category>,
    /// Absolute purchase link.
    pub purchase_url: String,
    /// Absolute free-trial link.
    pub free_trial_url: Option<String>,
}

/// Every course paragraph with a usable title and purchase link.
///
/// Entries are returned in document order and may repeat ids.
///
/// # Errors
/// Returns an error if a selector cannot be compiled.
pub fn parse_entries(
    html: &str,
    base_url: &Url,
    min_title_chars: usize,
) -> Result<Vec<ListingEntry>, ScrapingError> {
    walk_entries(html, base_url, Some(min_title_chars))
}

// With `min_title_chars` unset, short and `http` titles are kept.
fn walk_entries(
    html: &str,
    base_url: &Url,
    min_title_chars: Option<usize>,
) -> Result<Vec<ListingEntry>, ScrapingError> {
    let document = Html::parse_document(html);
    let walk = selector(&format!("h1, h2, h3, h4, p.{COURSE_NAME_CLASS}"))?;
    let links = selector("a[href]")?;

    let mut entries = Vec::new();
    let mut category = None;

    for element in document.select(&walk) {
        if !has_class(&element, COURSE_NAME_CLASS) {
            let text = element_text(&element);
            if text.chars().count() < MAX_HEADING_CHARS {
                if let Some(found) = Category::detect(&text) {
                    tracing::debug!("Processing category: {found}");
                    category = Some(found);
                }
            }
            continue;
        }

        let title = strip_title(&element_text(&element));
        if min_title_chars.is_some_and(|min| !is_course_title(&title, min)) {
            continue;
        }

        let Some(list) = next_element_siblings(element).find(|e| e.value().name() == "ul") else {
            tracing::debug!("No link list after course {title:?}");
            continue;
        };

        let Some((id, purchase_url)) = purchase_link(list, &links, base_url) else {
            tracing::debug!("No purchase link for course {title:?}");
            continue;
        };

        let free_trial_url = list
            .select(&links)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| href.contains(TRIAL_PAGE))
            .find_map(|href| resolve_url(href, base_url))
            .map(String::from);

        entries.push(ListingEntry {
            identity: CourseIdentity::new(id, title),
            category,
            purchase_url: purchase_url.to_string(),
            free_trial_url,
        });
    }

    Ok(entries)
}

/// Raw `(id, title)` pairs for the duplicate and collision reports.
///
/// Unlike [`parse_entries`], no title is filtered out: every paragraph
/// with a purchase id is reported.
///
/// # Errors
/// Returns an error if a selector cannot be compiled.
pub fn parse_identities(html: &str, base_url: &Url) -> Result<Vec<CourseIdentity>, ScrapingError> {
    Ok(walk_entries(html, base_url, None)?
        .into_iter()
        .map(|entry| entry.identity)
        .collect())
}

/// Unique, categorized courses with id-suffixed slugs.
///
/// Entries outside any suite heading are skipped; the first entry per id
/// wins.
///
/// # Errors
/// Returns an error if a selector cannot be compiled.
pub fn parse_listing(
    html: &str,
    base_url: &Url,
    min_title_chars: usize,
) -> Result<Vec<ScrapedCourse>, ScrapingError> {
    let entries: Vec<ListingEntry> = parse_entries(html, base_url, min_title_chars)?
        .into_iter()
        .filter(|entry| entry.category.is_some())
        .collect();

    let identities: Vec<CourseIdentity> = entries.iter().map(|e| e.identity.clone()).collect();
    let unique = dedupe_by_id(&identities);
    let slugs = assign_slugs(&unique, SlugPolicy::AlwaysSuffix);

    let mut courses = Vec::with_capacity(unique.len());
    for identity in unique {
        let Some(entry) = entries.iter().find(|e| e.identity.id == identity.id) else {
            continue;
        };
        let Some(slug) = slugs.get(&identity.id).cloned() else {
            continue;
        };
        courses.push(ScrapedCourse {
            id: identity.id,
            title: identity.title,
            slug,
            category: entry.category,
            purchase_url: Some(entry.purchase_url.clone()),
            free_trial_url: entry.free_trial_url.clone(),
            icon_url: None,
            description: None,
            assets: Vec::new(),
        });
    }

    tracing::info!("Found {} unique courses", courses.len());
    Ok(courses)
}

fn strip_title(text: &str) -> String {
    text.trim_end_matches(':').trim().to_string()
}

fn is_course_title(title: &str, min_chars: usize) -> bool {
    title.chars().count() >= min_chars && !title.starts_with("http")
}

fn purchase_link(
    list: ElementRef<'_>,
    links: &scraper::Selector,
    base_url: &Url,
) -> Option<(CourseId, Url)> {
    list.select(links)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains(PURCHASE_PAGE))
        .filter_map(|href| resolve_url(href, base_url))
        .find_map(|url| {
            let id = query_param(&url, "nid")?.parse::<CourseId>().ok()?;
            Some((id, url))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <p class="webContent_courseName">Orphan Course:</p>
          <ul><li><a href="purchaseCourse.php?nid=99">Buy</a></li></ul>

          <h2>Health &amp; Safety</h2>
          <div class="moduleListWhite">
            <p class="webContent_courseName">Abrasive Wheels:</p>
            <ul>
              <li><a href="purchaseCourse.php?nid=10">Buy</a></li>
              <li><a href="freeTrial.php?nid=10">Try</a></li>
            </ul>
          </div>
          <div class="moduleListWhite">
            <p class="webContent_courseName">Abrasive Wheels</p>
            <ul><li><a href="purchaseCourse.php?nid=26">Buy</a></li></ul>
          </div>
          <div class="moduleListWhite">
            <p class="webContent_courseName">Abrasive Wheels (old)</p>
            <ul><li><a href="purchaseCourse.php?nid=10">Buy</a></li></ul>
          </div>
          <div class="moduleListWhite">
            <p class="webContent_courseName">http://broken</p>
            <ul><li><a href="purchaseCourse.php?nid=11">Buy</a></li></ul>
          </div>
          <div class="moduleListWhite">
            <p class="webContent_courseName">No Link</p>
            <ul><li><a href="purchaseCourse.php">Buy</a></li></ul>
          </div>

          <h3>Business Skills</h3>
          <div class="moduleListWhite">
            <p class="webContent_courseName">Time Management</p>
            <span>spacer</span>
            <ul><li><a href="https://shop.example.com/purchaseCourse.php?x=1&amp;nid=31">Buy</a></li></ul>
          </div>
        </body></html>
    "#;

    fn base() -> Url {
        Url::parse("https://videotilehost.com/hamptonsafety/adminWebsiteContent.php").unwrap()
    }

    #[test]
    fn test_parse_entries_keeps_duplicates() {
        let entries = parse_entries(PAGE, &base(), 3).unwrap();
        let ids: Vec<u32> = entries.iter().map(|e| e.identity.id.get()).collect();
        assert_eq!(ids, vec![99, 10, 26, 10, 31]);
        assert_eq!(entries[0].category, None);
        assert_eq!(entries[1].category, Some(Category::HealthAndSafety));
        assert_eq!(entries[4].category, Some(Category::BusinessSkills));
    }

    #[test]
    fn test_title_colon_stripped_and_links_resolved() {
        let entries = parse_entries(PAGE, &base(), 3).unwrap();
        let first = &entries[1];
        assert_eq!(first.identity.title, "Abrasive Wheels");
        assert_eq!(
            first.purchase_url,
            "https://videotilehost.com/hamptonsafety/purchaseCourse.php?nid=10"
        );
        assert_eq!(
            first.free_trial_url.as_deref(),
            Some("https://videotilehost.com/hamptonsafety/freeTrial.php?nid=10")
        );
        assert_eq!(entries[2].free_trial_url, None);
    }

    #[test]
    fn test_parse_listing_dedupes_and_suffixes() {
        let courses = parse_listing(PAGE, &base(), 3).unwrap();
        let slugs: Vec<&str> = courses.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(
            slugs,
            vec!["abrasive-wheels-10", "abrasive-wheels-26", "time-management-31"]
        );
        assert_eq!(courses[0].title, "Abrasive Wheels");
        assert!(courses.iter().all(|c| c.purchase_url.is_some()));
    }

    #[test]
    fn test_parse_identities_feed_collision_report() {
        let identities = parse_identities(PAGE, &base()).unwrap();
        let collisions = crate::matching::find_slug_collisions(&identities);
        let group = &collisions[&crate::matching::slugify("abrasive wheels")];
        let ids: Vec<u32> = group.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![10, 26]);
    }

    #[test]
    fn test_parse_identities_keeps_filtered_titles() {
        let identities = parse_identities(PAGE, &base()).unwrap();
        let ids: Vec<u32> = identities.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![99, 10, 26, 10, 11, 31]);
        assert_eq!(identities[4].title, "http://broken");

        let html = r#"<h2>Hospitality</h2>
            <p class="webContent_courseName">AB:</p>
            <ul><li><a href="purchaseCourse.php?nid=5">Buy</a></li></ul>"#;
        let identities = parse_identities(html, &base()).unwrap();
        assert_eq!(identities, vec![CourseIdentity::new(CourseId(5), "AB")]);
    }

    #[test]
    fn test_short_titles_skipped() {
        let html = r#"<h2>Hospitality</h2>
            <p class="webContent_courseName">AB:</p>
            <ul><li><a href="purchaseCourse.php?nid=5">Buy</a></li></ul>"#;
        assert!(parse_entries(html, &base(), 3).unwrap().is_empty());
    }
}
