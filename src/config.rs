//! Settings file loading.
//!
//! The ingestion job and the query CLI both read a small TOML settings
//! file whose `[database]` table names the SQLite database location.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application settings loaded from a TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Database connection settings
    pub database: DatabaseSettings,
}

/// Database connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file
    pub path: PathBuf,
}

impl Settings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read settings file {}", path.display()), e)
        })?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Invalid settings file: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() {
        let settings = Settings::from_toml(
            r#"
            [database]
            path = "/var/lib/postcode-speeds/speeds.db"
            "#,
        )
        .unwrap();

        assert_eq!(
            settings.database.path,
            PathBuf::from("/var/lib/postcode-speeds/speeds.db")
        );
    }

    #[test]
    fn test_missing_database_table_is_a_configuration_error() {
        let result = Settings::from_toml("[logging]\nlevel = \"info\"\n");
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_load_missing_file_is_an_io_error() {
        let result = Settings::load(Path::new("/nonexistent/settings.toml"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
