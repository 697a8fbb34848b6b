//! Application configuration assembled from environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::matching::{AliasError, AliasTable, MatcherConfig, TitleMatcher};
use crate::scraping::ScrapingConfig;
use crate::store::{StoreConfig, StoreError};

/// Admin page URL override.
pub const ENV_ADMIN_URL: &str = "CATALOG_ADMIN_URL";
/// Asset host override.
pub const ENV_ASSET_HOST: &str = "CATALOG_ASSET_HOST";
/// `SQLite` database path.
pub const ENV_DB_PATH: &str = "CATALOG_DB_PATH";
/// JSON alias file replacing the seed table.
pub const ENV_ALIAS_FILE: &str = "CATALOG_ALIAS_FILE";
/// Token-overlap threshold in `0.0..=1.0`.
pub const ENV_TOKEN_OVERLAP: &str = "CATALOG_TOKEN_OVERLAP";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An environment variable could not be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// Alias table could not be loaded.
    #[error("alias table error: {0}")]
    Alias(#[from] AliasError),
    /// Storage settings rejected.
    #[error("storage configuration error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration for the catalog tooling.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Scraper settings.
    pub scraping: ScrapingConfig,
    /// Storage settings.
    pub storage: StoreConfig,
    /// Title matcher settings.
    pub matching: MatcherConfig,
    /// Optional JSON alias file; the seed table is used when absent.
    pub alias_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load from the process environment and validate.
    ///
    /// # Errors
    /// Returns an error if a variable is malformed or validation fails.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup and validate.
    ///
    /// Unset or blank variables keep their defaults.
    ///
    /// # Errors
    /// Returns an error if a variable is malformed or validation fails.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(url) = var(ENV_ADMIN_URL) {
            config.scraping = config.scraping.with_admin_url(url);
        }
        if let Some(host) = var(ENV_ASSET_HOST) {
            config.scraping = config.scraping.with_asset_host(host);
        }
        if let Some(path) = var(ENV_DB_PATH) {
            config.storage = config.storage.with_path(path);
        }
        if let Some(path) = var(ENV_ALIAS_FILE) {
            config.alias_file = Some(PathBuf::from(path));
        }
        if let Some(raw) = var(ENV_TOKEN_OVERLAP) {
            let threshold = raw.parse::<f64>().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_TOKEN_OVERLAP,
                value: raw.clone(),
            })?;
            config.matching = config.matching.with_threshold(threshold);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ConfigResult<()> {
        Url::parse(&self.scraping.admin_url)?;
        Url::parse(&self.scraping.asset_host)?;

        if self.scraping.min_title_chars == 0 {
            return Err(ConfigError::InvalidConfig(
                "scraping.min_title_chars must be > 0".to_string(),
            ));
        }

        let threshold = self.matching.token_overlap_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidConfig(format!(
                "matching.token_overlap_threshold must be within 0..=1, got {threshold}"
            )));
        }

        if self.matching.rules.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "matching.rules must not be empty".to_string(),
            ));
        }

        self.storage.validate()?;
        Ok(())
    }

    /// The alias table: the configured file, or the seed pairs.
    ///
    /// # Errors
    /// Returns an error if the alias file cannot be read or parsed.
    pub fn load_aliases(&self) -> ConfigResult<AliasTable> {
        match &self.alias_file {
            Some(path) => Ok(AliasTable::from_file(path)?),
            None => Ok(AliasTable::seed()),
        }
    }

    /// A matcher built from the alias table and matcher settings.
    ///
    /// # Errors
    /// Returns an error if the alias file cannot be loaded.
    pub fn title_matcher(&self) -> ConfigResult<TitleMatcher> {
        Ok(TitleMatcher::new(self.load_aliases()?, self.matching.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.scraping, ScrapingConfig::default());
        assert_eq!(config.storage, StoreConfig::default());
        assert!(config.alias_file.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_ADMIN_URL, "https://example.com/admin.php"),
            (ENV_ASSET_HOST, "https://cdn.example.com/"),
            (ENV_DB_PATH, "/tmp/catalog.sqlite"),
            (ENV_TOKEN_OVERLAP, "0.75"),
            (ENV_ALIAS_FILE, "  "),
        ]))
        .unwrap();

        assert_eq!(config.scraping.admin_url, "https://example.com/admin.php");
        assert_eq!(config.scraping.asset_host, "https://cdn.example.com");
        assert_eq!(
            config.storage.sqlite_path,
            PathBuf::from("/tmp/catalog.sqlite")
        );
        assert!((config.matching.token_overlap_threshold - 0.75).abs() < f64::EPSILON);
        assert!(config.alias_file.is_none());
    }

    #[test]
    fn test_invalid_threshold() {
        let err = AppConfig::from_lookup(lookup(&[(ENV_TOKEN_OVERLAP, "abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));

        let err = AppConfig::from_lookup(lookup(&[(ENV_TOKEN_OVERLAP, "1.5")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn test_invalid_admin_url() {
        let err = AppConfig::from_lookup(lookup(&[(ENV_ADMIN_URL, "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::Url(_)));
    }

    #[test]
    fn test_seed_aliases_without_file() {
        let config = AppConfig::default();
        let matcher = config.title_matcher().unwrap();
        assert!(matcher.matches("DSE", "Display Screen Equipment"));
    }

    #[test]
    fn test_missing_alias_file() {
        let config = AppConfig {
            alias_file: Some(PathBuf::from("/nonexistent/aliases.json")),
            ..AppConfig::default()
        };
        assert!(matches!(config.load_aliases(), Err(ConfigError::Alias(_))));
    }
}
