//! Course description extraction.
//!
//! Two sources:
//! - the admin page, where a title paragraph is followed by a textarea but
//!   nothing links the pair to a course id, so titles are fuzzy-matched;
//! - static HTML exports, where an `h2.vtheading` is followed by
//!   `p.vtptext` paragraphs and the id is recoverable from the icon or
//!   the purchase link.

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::matching::{CourseId, TitleMatcher};
use crate::scraping::error::ScrapingError;
use crate::scraping::html::{element_text, has_class, next_element_siblings, selector};
use crate::scraping::types::{ScrapedCourse, StaticDescription};

const FIELD_TAGS: [&str; 2] = ["textarea", "input"];
const STOP_TAGS: [&str; 4] = ["p", "h2", "h3", "h4"];

/// Attach admin-page descriptions to courses that have none.
///
/// Each `p`, `strong` or `b` element is compared with the titles of the
/// courses still lacking a description; the first match claims the next
/// sibling `textarea`/`input` whose text is longer than `min_chars`.
/// The scan stops at the next paragraph or heading.
///
/// Returns the number of descriptions attached.
///
/// # Errors
/// Returns an error if a selector cannot be compiled.
pub fn attach_admin_descriptions(
    html: &str,
    courses: &mut [ScrapedCourse],
    matcher: &TitleMatcher,
    min_chars: usize,
) -> Result<usize, ScrapingError> {
    let document = Html::parse_document(html);
    let candidates = selector("p, strong, b")?;
    let mut found = 0;

    for element in document.select(&candidates) {
        let text = element_text(&element);
        if text.is_empty() {
            continue;
        }

        let Some(course) = courses
            .iter_mut()
            .filter(|c| c.description.is_none())
            .find(|c| matcher.matches(&c.title, &text))
        else {
            continue;
        };

        if let Some(description) = following_field_text(element, min_chars) {
            tracing::debug!("Description for course {} matched on {text:?}", course.id);
            course.description = Some(description);
            found += 1;
        }
    }

    tracing::info!("Parsed {found}/{} descriptions", courses.len());
    Ok(found)
}

fn following_field_text(element: ElementRef<'_>, min_chars: usize) -> Option<String> {
    for sibling in next_element_siblings(element) {
        let name = sibling.value().name();
        if FIELD_TAGS.contains(&name) {
            let text = sibling
                .value()
                .attr("value")
                .map_or_else(|| element_text(&sibling), crate::scraping::html::clean_text);
            if text.chars().count() > min_chars {
                return Some(text);
            }
        }
        if STOP_TAGS.contains(&name) {
            break;
        }
    }
    None
}

/// Description blocks from a static HTML export.
///
/// Blocks whose id cannot be recovered are skipped with a warning.
///
/// # Errors
/// Returns an error if a selector or pattern cannot be compiled.
pub fn parse_static_descriptions(html: &str) -> Result<Vec<StaticDescription>, ScrapingError> {
    let document = Html::parse_document(html);
    let headings = selector("h2.vtheading")?;
    let icons = selector("img.vticons")?;
    let icon_id = Regex::new(r"course(\d+)\.png")?;
    let nid = Regex::new(r"nid=(\d+)")?;

    let mut found = Vec::new();

    for heading in document.select(&headings) {
        let title = element_text(&heading);

        let Some(description_para) = next_element_siblings(heading)
            .find(|e| e.value().name() == "p" && has_class(e, "vtptext"))
        else {
            continue;
        };

        let id = description_para
            .select(&icons)
            .filter_map(|img| img.value().attr("src"))
            .find_map(|src| capture_id(&icon_id, src))
            .or_else(|| purchase_id(description_para, &nid));

        let Some(id) = id else {
            tracing::warn!("Could not find course ID for: {title}");
            continue;
        };

        let mut description = element_text(&description_para);
        for continuation in next_element_siblings(description_para)
            .take_while(|e| e.value().name() == "p" && has_class(e, "vtptext"))
        {
            let text = element_text(&continuation);
            if !text.is_empty() {
                description.push(' ');
                description.push_str(&text);
            }
        }

        found.push(StaticDescription {
            id,
            title,
            description,
        });
    }

    tracing::info!("Found {} course descriptions", found.len());
    Ok(found)
}

fn capture_id(pattern: &Regex, text: &str) -> Option<CourseId> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

// Fallback: the purchase link after the `p.vtdetails` paragraph.
fn purchase_id(description_para: ElementRef<'_>, nid: &Regex) -> Option<CourseId> {
    let details = next_element_siblings(description_para)
        .find(|e| e.value().name() == "p" && has_class(e, "vtdetails"))?;

    next_element_siblings(details)
        .filter(|e| e.value().name() == "a")
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains("purchaseCourse.php"))
        .find_map(|href| capture_id(nid, href))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::slugify;

    fn course(id: u32, title: &str) -> ScrapedCourse {
        ScrapedCourse {
            id: CourseId(id),
            title: title.to_string(),
            slug: slugify(title).with_suffix(id),
            category: None,
            purchase_url: None,
            free_trial_url: None,
            icon_url: None,
            description: None,
            assets: Vec::new(),
        }
    }

    const ADMIN: &str = r#"
        <div>
          <p>Food Hygiene Level 2</p>
          <textarea>Learn how to handle food safely in a commercial kitchen.</textarea>
        </div>
        <div>
          <p>DSE Assessment</p>
          <input value="Set up a workstation that protects your posture and eyesight.">
        </div>
        <div>
          <p>Fire Safety</p>
          <textarea>Too short</textarea>
        </div>
        <div>
          <p>Manual Handling</p>
          <p>Unrelated paragraph</p>
          <textarea>This textarea belongs to something else entirely.</textarea>
        </div>
    "#;

    #[test]
    fn test_admin_descriptions_matched_by_title() {
        let mut courses = vec![
            course(1, "Food Safety Level 2"),
            course(2, "Display Screen Equipment Assessment"),
            course(3, "Fire Safety"),
            course(4, "Manual Handling"),
        ];
        let found =
            attach_admin_descriptions(ADMIN, &mut courses, &TitleMatcher::default(), 20).unwrap();

        assert_eq!(found, 2);
        assert!(courses[0].description.as_deref().unwrap().starts_with("Learn how"));
        assert!(courses[1].description.as_deref().unwrap().starts_with("Set up"));
        assert_eq!(courses[2].description, None);
        assert_eq!(courses[3].description, None);
    }

    const EXPORT: &str = r#"
        <h2 class="vtheading">Abrasive Wheels</h2>
        <p class="vtptext"><img class="vticons" src="https://videotilehost.com/common/course-icons/course26.png">
          This course covers the safe use of abrasive wheels.</p>
        <p class="vtptext">It includes mounting and inspection.</p>
        <p class="vtdetails">Duration: 1 hour</p>
        <a class="vtbuttons" href="purchaseCourse.php?nid=26">Buy</a>

        <h2 class="vtheading">Time Management</h2>
        <p class="vtptext">Plan your working day.</p>
        <p class="vtdetails">Duration: 30 minutes</p>
        <a class="vtbuttons" href="freeTrial.php?nid=40">Try</a>
        <a class="vtbuttons" href="purchaseCourse.php?nid=40">Buy</a>

        <h2 class="vtheading">Mystery Course</h2>
        <p class="vtptext">No id anywhere.</p>
    "#;

    #[test]
    fn test_static_descriptions() {
        let found = parse_static_descriptions(EXPORT).unwrap();
        assert_eq!(found.len(), 2);

        assert_eq!(found[0].id, CourseId(26));
        assert_eq!(found[0].title, "Abrasive Wheels");
        assert_eq!(
            found[0].description,
            "This course covers the safe use of abrasive wheels. It includes mounting and inspection."
        );

        assert_eq!(found[1].id, CourseId(40));
        assert_eq!(found[1].description, "Plan your working day.");
    }
}
