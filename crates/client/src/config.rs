//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_API_URL` - Backend origin (default: `http://localhost:3000`)
//! - `STOREFRONT_STATE_FILE` - JSON file backing durable client state
//!   (default: `.storefront-state.json`)
//! - `STOREFRONT_USER_AGENT` - User-Agent header override

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Backend origin used when `STOREFRONT_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

const DEFAULT_STATE_FILE: &str = ".storefront-state.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin; request paths are appended to it verbatim.
    pub api_url: Url,
    /// File backing durable client state.
    pub state_file: PathBuf,
    /// User-Agent header override.
    pub user_agent: Option<String>,
}

impl ClientConfig {
    /// Configuration for the given backend origin with defaults elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an absolute
    /// http(s) URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url("STOREFRONT_API_URL", api_url)?,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            user_agent: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(
            "STOREFRONT_API_URL",
            &get_env_or_default("STOREFRONT_API_URL", DEFAULT_API_URL),
        )?;
        let state_file = PathBuf::from(get_env_or_default(
            "STOREFRONT_STATE_FILE",
            DEFAULT_STATE_FILE,
        ));
        let user_agent = get_optional_env("STOREFRONT_USER_AGENT");

        Ok(Self {
            api_url,
            state_file,
            user_agent,
        })
    }

    /// The origin as a string without a trailing slash.
    #[must_use]
    pub fn origin(&self) -> String {
        self.api_url.as_str().trim_end_matches('/').to_string()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_api_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_origin() {
        let config = ClientConfig::new(DEFAULT_API_URL).unwrap();
        assert_eq!(config.origin(), "http://localhost:3000");
    }

    #[test]
    fn test_origin_strips_trailing_slash() {
        let config = ClientConfig::new("https://api.example.com/").unwrap();
        assert_eq!(config.origin(), "https://api.example.com");

        let config = ClientConfig::new("https://api.example.com/v2/").unwrap();
        assert_eq!(config.origin(), "https://api.example.com/v2");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = ClientConfig::new("ftp://files.example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_rejects_relative_url() {
        assert!(ClientConfig::new("/api").is_err());
    }
}
