//! Storage configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::error::{StoreError, StoreResult};

/// Where and under which table names courses are persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `SQLite` database path.
    pub sqlite_path: PathBuf,
    /// Course table name.
    pub courses_table: String,
    /// Asset table name.
    pub assets_table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("courses.sqlite"),
            courses_table: "courses".to_string(),
            assets_table: "course_assets".to_string(),
        }
    }
}

impl StoreConfig {
    /// Use a different database file.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sqlite_path = path.into();
        self
    }

    /// Validate table names.
    ///
    /// Table names are interpolated into SQL, so only ASCII letters,
    /// digits and underscores are accepted.
    ///
    /// # Errors
    /// Returns an error if a table name is empty, contains other
    /// characters, or both tables share a name.
    pub fn validate(&self) -> StoreResult<()> {
        for (field, name) in [
            ("courses_table", &self.courses_table),
            ("assets_table", &self.assets_table),
        ] {
            if name.is_empty()
                || !name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(StoreError::InvalidConfig(format!(
                    "{field} must be a non-empty identifier, got {name:?}"
                )));
            }
        }

        if self.courses_table == self.assets_table {
            return Err(StoreError::InvalidConfig(
                "courses_table and assets_table must differ".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(StoreConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_unsafe_table_names() {
        let config = StoreConfig {
            courses_table: "courses; DROP TABLE x".to_string(),
            ..StoreConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StoreError::InvalidConfig(_))
        ));

        let config = StoreConfig {
            assets_table: "courses".to_string(),
            ..StoreConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
