//! Configuration management for the catalog client.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Which backend the data source talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSource {
    /// In-memory sample catalog
    #[default]
    Mock,
    /// REST API at [`CatalogConfig::api_url`]
    Http,
}

impl std::str::FromStr for DataSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "http" => Ok(Self::Http),
            other => Err(ConfigError::Invalid {
                key: "CATALOG_DATA_SOURCE",
                value: other.to_string(),
            }),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but can't be parsed
    #[error("invalid value {value:?} for {key}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Backend selection (`CATALOG_DATA_SOURCE`, default `mock`)
    pub data_source: DataSource,
    /// REST API root (`CATALOG_API_URL`, default `http://localhost:3000`)
    pub api_url: String,
    /// Mock latency per call (`CATALOG_MOCK_DELAY_MS`, default 1500)
    pub mock_delay: Duration,
    /// Bound for facade request/response calls and HTTP requests
    /// (`CATALOG_REQUEST_TIMEOUT_SECS`, default 30)
    pub request_timeout: Duration,
    /// Grace period for pending effects on shutdown
    /// (`CATALOG_SHUTDOWN_TIMEOUT_SECS`, default 5)
    pub shutdown_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_source: DataSource::Mock,
            api_url: "http://localhost:3000".to_string(),
            mock_delay: Duration::from_millis(1500),
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Unset keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a key maps to an unparsable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_source = match lookup("CATALOG_DATA_SOURCE") {
            Some(value) => value.parse()?,
            None => defaults.data_source,
        };

        let api_url = lookup("CATALOG_API_URL").unwrap_or(defaults.api_url);

        let mock_delay = parse_u64(&lookup, "CATALOG_MOCK_DELAY_MS")?
            .map_or(defaults.mock_delay, Duration::from_millis);
        let request_timeout = parse_u64(&lookup, "CATALOG_REQUEST_TIMEOUT_SECS")?
            .map_or(defaults.request_timeout, Duration::from_secs);
        let shutdown_timeout = parse_u64(&lookup, "CATALOG_SHUTDOWN_TIMEOUT_SECS")?
            .map_or(defaults.shutdown_timeout, Duration::from_secs);

        Ok(Self {
            data_source,
            api_url,
            mock_delay,
            request_timeout,
            shutdown_timeout,
        })
    }
}

fn parse_u64<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value.trim().parse().map_err(|_| ConfigError::Invalid {
                key,
                value: value.clone(),
            })
        })
        .transpose()
}
