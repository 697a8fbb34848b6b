//! Configuration for the catalog scraper.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Admin page listing every course with its purchase and trial links.
pub const DEFAULT_ADMIN_URL: &str =
    "https://videotilehost.com/hamptonsafety/adminWebsiteContent.php";

/// Host serving course icons, embeds and information sheets.
pub const DEFAULT_ASSET_HOST: &str = "https://videotilehost.com";

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Hampton Safety Course Scraper)";

/// Configuration for the scraping service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapingConfig {
    /// Admin page to fetch.
    pub admin_url: String,
    /// Base URL for constructed asset links (no trailing slash).
    pub asset_host: String,
    /// User agent header.
    pub user_agent: String,
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// Maximum page size to download (bytes).
    pub max_content_length: usize,
    /// Descriptions this short or shorter are ignored.
    pub min_description_chars: usize,
    /// Titles shorter than this are treated as parse noise.
    pub min_title_chars: usize,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            admin_url: DEFAULT_ADMIN_URL.to_string(),
            asset_host: DEFAULT_ASSET_HOST.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_content_length: 20 * 1024 * 1024, // 20 MB
            min_description_chars: 20,
            min_title_chars: 3,
        }
    }
}

impl ScrapingConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the admin page URL.
    #[must_use]
    pub fn with_admin_url(mut self, url: impl Into<String>) -> Self {
        self.admin_url = url.into();
        self
    }

    /// Set the asset host; a trailing slash is dropped.
    #[must_use]
    pub fn with_asset_host(mut self, host: impl Into<String>) -> Self {
        let host = host.into();
        self.asset_host = host.trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the minimum description length.
    #[must_use]
    pub const fn with_min_description_chars(mut self, chars: usize) -> Self {
        self.min_description_chars = chars;
        self
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScrapingConfig::default();
        assert_eq!(config.admin_url, DEFAULT_ADMIN_URL);
        assert_eq!(config.min_description_chars, 20);
        assert_eq!(config.min_title_chars, 3);
    }

    #[test]
    fn test_config_builder() {
        let config = ScrapingConfig::new()
            .with_admin_url("http://localhost:8080/admin.php")
            .with_asset_host("http://cdn.local/")
            .with_timeout(Duration::from_secs(60));

        assert_eq!(config.admin_url, "http://localhost:8080/admin.php");
        assert_eq!(config.asset_host, "http://cdn.local");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_timeouts_serialize_as_seconds() {
        let json = serde_json::to_value(ScrapingConfig::default()).unwrap();
        assert_eq!(json["request_timeout"], 30);
        let back: ScrapingConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, ScrapingConfig::default());
    }
}
