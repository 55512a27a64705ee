//! Configuration management
//!
//! Loads configuration for the lectern data layer from:
//! - a config.yml file
//! - environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum number of pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "data/lectern.db".to_string()
}

fn default_max_connections() -> u32 {
    20
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file.
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// Environment variables override file settings afterwards.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
                path: path.display().to_string(),
                source: e,
            })?;

            if content.trim().is_empty() {
                Self::default()
            } else {
                serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?
            }
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LECTERN_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(max) = std::env::var("LECTERN_DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse() {
                self.database.max_connections = max;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.url, "data/lectern.db");
        assert_eq!(config.database.max_connections, 20);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let config = Config::load(std::path::Path::new("does-not-exist.yml"))
            .expect("Missing file should yield defaults");
        assert_eq!(config.database.url, "data/lectern.db");
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "database:\n  url: \":memory:\"").expect("Failed to write config");

        let config = Config::load(file.path()).expect("Failed to load config");
        assert_eq!(config.database.url, ":memory:");
        assert_eq!(config.database.max_connections, 20);
    }

    #[test]
    fn test_load_invalid_yaml_fails() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "database: [not: valid").expect("Failed to write config");

        assert!(Config::load(file.path()).is_err());
    }
}
