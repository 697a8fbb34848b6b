//! Small helpers over `scraper` shared by the page parsers.

use scraper::{ElementRef, Selector};
use url::Url;

use crate::scraping::error::ScrapingError;

/// Compile a CSS selector.
///
/// # Errors
/// Returns an error if the selector is malformed.
pub fn selector(css: &str) -> Result<Selector, ScrapingError> {
    Selector::parse(css)
        .map_err(|e| ScrapingError::ExtractionFailed(format!("invalid selector {css:?}: {e}")))
}

/// Visible text of an element with whitespace collapsed.
#[must_use]
pub fn element_text(element: &ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Whether the element carries the given class.
#[must_use]
pub fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Following sibling elements, skipping text and comment nodes.
pub fn next_element_siblings(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.next_siblings().filter_map(ElementRef::wrap)
}

/// Collapse whitespace runs and trim.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_was_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space && !result.is_empty() {
                result.push(' ');
            }
            last_was_space = true;
        } else {
            result.push(c);
            last_was_space = false;
        }
    }

    result.trim_end().to_string()
}

/// Resolve a potentially relative URL against a base URL.
///
/// `javascript:`, `mailto:` and fragment-only links resolve to `None`.
#[must_use]
pub fn resolve_url(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with('#')
    {
        return None;
    }

    // Try to parse as absolute URL
    if let Ok(url) = Url::parse(href) {
        return Some(url);
    }

    base_url.join(href).ok()
}

/// Value of a query parameter.
#[must_use]
pub fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn base() -> Url {
        Url::parse("https://example.com/site/admin.php").unwrap()
    }

    #[test]
    fn test_clean_text() {
        let text = "  Hello   world  \n\t  test  ";
        assert_eq!(clean_text(text), "Hello world test");
    }

    #[test]
    fn test_resolve_url_relative() {
        let resolved = resolve_url("purchaseCourse.php?nid=26", &base()).unwrap();
        assert_eq!(
            resolved.as_str(),
            "https://example.com/site/purchaseCourse.php?nid=26"
        );
    }

    #[test]
    fn test_resolve_url_absolute_and_skipped() {
        let resolved = resolve_url("https://other.com/x.php", &base()).unwrap();
        assert_eq!(resolved.host_str(), Some("other.com"));
        assert!(resolve_url("javascript:void(0)", &base()).is_none());
        assert!(resolve_url("#top", &base()).is_none());
    }

    #[test]
    fn test_query_param() {
        let url = Url::parse("https://example.com/p.php?a=1&nid=42").unwrap();
        assert_eq!(query_param(&url, "nid").as_deref(), Some("42"));
        assert_eq!(query_param(&url, "x"), None);
    }

    #[test]
    fn test_element_helpers() {
        let doc = Html::parse_fragment(
            r#"<div><p class="a b">Fire <b>Safety</b></p> text <ul><li>x</li></ul></div>"#,
        );
        let p = doc.select(&selector("p").unwrap()).next().unwrap();
        assert_eq!(element_text(&p), "Fire Safety");
        assert!(has_class(&p, "b"));
        assert!(!has_class(&p, "c"));
        let names: Vec<&str> = next_element_siblings(p).map(|e| e.value().name()).collect();
        assert_eq!(names, vec!["ul"]);
    }
}
