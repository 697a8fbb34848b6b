//! Error types for the scraping module.

use thiserror::Error;

/// Errors that can occur during scraping operations.
#[derive(Debug, Error)]
pub enum ScrapingError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// The server answered with a non-success status.
    #[error("HTTP status {status} for {url}")]
    Status {
        /// Status code returned.
        status: u16,
        /// URL requested.
        url: String,
    },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Content extraction failed.
    #[error("Content extraction failed: {0}")]
    ExtractionFailed(String),

    /// Content type not supported.
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// Page larger than the configured limit.
    #[error("Content too large: {0} bytes")]
    ContentTooLarge(u64),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Regex error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl ScrapingError {
    /// Whether the failure came from the network rather than the page.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(
            self,
            Self::HttpRequest(_) | Self::HttpClient(_) | Self::Status { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = ScrapingError::Status {
            status: 503,
            url: "https://example.com/admin.php".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP status 503 for https://example.com/admin.php");
        assert!(err.is_network());
    }

    #[test]
    fn test_extraction_is_not_network() {
        let err = ScrapingError::ExtractionFailed("no courses".to_string());
        assert!(!err.is_network());
    }
}
