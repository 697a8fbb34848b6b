//! Course catalog scraping.
//!
//! This module turns the admin website-content page into course records:
//! - Listing extraction (suite headings, course paragraphs, purchase links)
//! - Fuzzy-matched admin descriptions
//! - Static-export description parsing
//! - Deterministic icon, video and PDF URLs

pub mod assets;
pub mod config;
pub mod descriptions;
pub mod error;
pub mod html;
pub mod listing;
pub mod types;

pub use config::ScrapingConfig;
pub use descriptions::{attach_admin_descriptions, parse_static_descriptions};
pub use error::ScrapingError;
pub use listing::{ListingEntry, parse_entries, parse_identities, parse_listing};
pub use types::{
    AssetKind, Category, CourseAsset, ScrapeReport, ScrapeStats, ScrapedCourse, StaticDescription,
};

use url::Url;

use crate::matching::{CourseIdentity, TitleMatcher};

/// Fetches the admin page and assembles course records.
pub struct CatalogScraper {
    config: ScrapingConfig,
    matcher: TitleMatcher,
    client: reqwest::Client,
}

impl CatalogScraper {
    /// Create a scraper with the given configuration and title matcher.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ScrapingConfig, matcher: TitleMatcher) -> Result<Self, ScrapingError> {
        let client = Self::build_client(&config)?;
        Ok(Self {
            config,
            matcher,
            client,
        })
    }

    /// Create a scraper with default configuration and the seed aliases.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, ScrapingError> {
        Self::new(ScrapingConfig::default(), TitleMatcher::default())
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ScrapingConfig {
        &self.config
    }

    fn build_client(config: &ScrapingConfig) -> Result<reqwest::Client, ScrapingError> {
        use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};

        let mut headers = HeaderMap::new();

        if let Ok(ua_value) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, ua_value);
        }

        if let Ok(accept) =
            HeaderValue::from_str("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        {
            headers.insert(ACCEPT, accept);
        }

        if let Ok(lang) = HeaderValue::from_str("en-GB,en;q=0.8") {
            headers.insert(ACCEPT_LANGUAGE, lang);
        }

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| ScrapingError::HttpClient(e.to_string()))
    }

    fn base_url(&self) -> Result<Url, ScrapingError> {
        Ok(Url::parse(&self.config.admin_url)?)
    }

    /// Download the admin page HTML.
    ///
    /// # Errors
    /// Returns an error on network failure, a non-success status, an
    /// oversized body or a non-HTML content type.
    pub async fn fetch_admin_page(&self) -> Result<String, ScrapingError> {
        let url = self.base_url()?;
        tracing::info!("Fetching course data from {url}");

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapingError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.config.max_content_length {
                return Err(ScrapingError::ContentTooLarge(len));
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !content_type.contains("text/html") && !content_type.contains("text/plain") {
            return Err(ScrapingError::UnsupportedContentType(content_type));
        }

        let html = response.text().await?;
        if html.len() > self.config.max_content_length {
            return Err(ScrapingError::ContentTooLarge(html.len() as u64));
        }

        tracing::debug!("Fetched {} bytes", html.len());
        Ok(html)
    }

    /// Build the full report from admin-page HTML.
    ///
    /// # Errors
    /// Returns an error if the configured admin URL is invalid or no
    /// course could be extracted.
    pub fn scrape_html(&self, html: &str) -> Result<ScrapeReport, ScrapingError> {
        let base_url = self.base_url()?;
        let mut courses = parse_listing(html, &base_url, self.config.min_title_chars)?;
        if courses.is_empty() {
            return Err(ScrapingError::ExtractionFailed(
                "no courses found on the admin page".to_string(),
            ));
        }

        assets::attach_assets(&self.config.asset_host, &mut courses);
        attach_admin_descriptions(
            html,
            &mut courses,
            &self.matcher,
            self.config.min_description_chars,
        )?;

        let report = ScrapeReport::new(courses);
        tracing::info!(
            "Scraped {} courses ({} with descriptions)",
            report.stats.total_courses,
            report.stats.with_descriptions
        );
        Ok(report)
    }

    /// Raw `(id, title)` pairs from admin-page HTML, duplicates included.
    ///
    /// # Errors
    /// Returns an error if the configured admin URL is invalid.
    pub fn identities_from_html(&self, html: &str) -> Result<Vec<CourseIdentity>, ScrapingError> {
        let base_url = self.base_url()?;
        parse_identities(html, &base_url)
    }

    /// Fetch the admin page and build the report.
    ///
    /// # Errors
    /// Returns an error if fetching or extraction fails.
    pub async fn scrape(&self) -> Result<ScrapeReport, ScrapingError> {
        let html = self.fetch_admin_page().await?;
        self.scrape_html(&html)
    }

    /// Fetch the admin page and return its raw `(id, title)` pairs.
    ///
    /// # Errors
    /// Returns an error if fetching or extraction fails.
    pub async fn fetch_identities(&self) -> Result<Vec<CourseIdentity>, ScrapingError> {
        let html = self.fetch_admin_page().await?;
        self.identities_from_html(&html)
    }
}
