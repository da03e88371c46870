//! Client configuration.
//!
//! Loaded from environment variables with sensible defaults, so a host
//! shell can point the core at staging or a local backend without a
//! rebuild.
//!
//! ## Environment Variables
//! - `AJO_API_BASE_URL`: Backend base URL
//! - `AJO_REQUEST_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `AJO_CACHE_TTL_SECS`: Default cache TTL in seconds
//! - `AJO_PROBE_INTERVAL_SECS`: Connectivity probe interval in seconds
//! - `AJO_DATA_DIR`: Directory for the persistent store document

use std::path::PathBuf;
use std::time::Duration;

use ajo_domain::ApiError;
use tracing::debug;

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the backend (e.g. "https://api.ajoapp.dev/v1").
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Default TTL applied to cached GET responses.
    pub cache_ttl: Duration,
    /// Interval between connectivity probes.
    pub probe_interval: Duration,
    /// Directory for durable state; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.ajoapp.dev/v1".to_string(),
            request_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(300),
            probe_interval: Duration::from_secs(30),
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if a set variable has an invalid value.
    pub fn from_env() -> Result<Self, ApiError> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("AJO_API_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(secs) = env_secs("AJO_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = secs;
        }
        if let Some(secs) = env_secs("AJO_CACHE_TTL_SECS")? {
            config.cache_ttl = secs;
        }
        if let Some(secs) = env_secs("AJO_PROBE_INTERVAL_SECS")? {
            config.probe_interval = secs;
        }
        if let Ok(dir) = std::env::var("AJO_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        debug!(base_url = %config.base_url, "configuration loaded");
        Ok(config)
    }

    /// Check invariants the client relies on.
    ///
    /// # Errors
    /// Returns `ApiError::Config` on an empty or non-HTTP base URL or a
    /// zero timeout.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.base_url.is_empty() {
            return Err(ApiError::config("base URL must not be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::config(format!("base URL must be HTTP(S): {}", self.base_url)));
        }
        if self.request_timeout.is_zero() {
            return Err(ApiError::config("request timeout must be greater than zero"));
        }
        Ok(())
    }
}

fn env_secs(name: &str) -> Result<Option<Duration>, ApiError> {
    match std::env::var(name) {
        Ok(value) => {
            let secs: u64 = value
                .parse()
                .map_err(|_| ApiError::config(format!("{name} must be an integer: {value:?}")))?;
            Ok(Some(Duration::from_secs(secs)))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let config = ClientConfig { base_url: "ftp://nope".to_string(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ApiError::Config { .. })));

        let config = ClientConfig { base_url: String::new(), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config =
            ClientConfig { request_timeout: Duration::ZERO, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
