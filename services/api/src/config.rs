//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where student records are read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSourceKind {
    /// A JSON workbook on local disk.
    Workbook { path: PathBuf },
    /// A remote spreadsheet script answering `?email=` queries.
    Remote {
        backend_url: String,
        leads_url: Option<String>,
    },
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub data_source: DataSourceKind,
    pub allowed_origin: String,
    pub request_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Load Server Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin =
            lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:8080".to_string());

        let timeout_str = lookup("REQUEST_TIMEOUT_SECS").unwrap_or_else(|| "10".to_string());
        let request_timeout = timeout_str
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| {
                ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        // --- Load Data Source Settings ---
        let source = lookup("DATA_SOURCE").unwrap_or_else(|| "workbook".to_string());
        let data_source = match source.to_lowercase().as_str() {
            "workbook" => DataSourceKind::Workbook {
                path: lookup("WORKBOOK_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./data/workbook.json")),
            },
            "remote" => DataSourceKind::Remote {
                backend_url: lookup("BACKEND_URL")
                    .ok_or_else(|| ConfigError::MissingVar("BACKEND_URL".to_string()))?,
                leads_url: lookup("LEADS_URL"),
            },
            other => {
                return Err(ConfigError::InvalidValue(
                    "DATA_SOURCE".to_string(),
                    format!("'{}' is not one of workbook, remote", other),
                ))
            }
        };

        Ok(Self {
            bind_address,
            log_level,
            data_source,
            allowed_origin,
            request_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_local_workbook() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(
            config.data_source,
            DataSourceKind::Workbook {
                path: PathBuf::from("./data/workbook.json")
            }
        );
    }

    #[test]
    fn remote_source_requires_backend_url() {
        let err = load(&[("DATA_SOURCE", "remote")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(var) if var == "BACKEND_URL"));

        let config = load(&[
            ("DATA_SOURCE", "Remote"),
            ("BACKEND_URL", "https://script.example.com/exec"),
        ])
        .unwrap();
        assert_eq!(
            config.data_source,
            DataSourceKind::Remote {
                backend_url: "https://script.example.com/exec".to_string(),
                leads_url: None,
            }
        );
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            load(&[("BIND_ADDRESS", "not-an-address")]),
            Err(ConfigError::InvalidValue(..))
        ));
        assert!(matches!(
            load(&[("RUST_LOG", "chatty")]),
            Err(ConfigError::InvalidValue(..))
        ));
        assert!(matches!(
            load(&[("DATA_SOURCE", "postgres")]),
            Err(ConfigError::InvalidValue(..))
        ));
    }
}
