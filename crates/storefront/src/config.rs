//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `VERDANT_API_BASE` - Base URL of the remote commerce API (default: `http://localhost:5000/api/v1`)
//! - `VERDANT_ASSET_BASE` - Base URL relative image paths resolve against (default: the API base)
//! - `VERDANT_DATA_DIR` - Directory for persisted cart, wishlist and credential (default: `.verdant`)
//! - `VERDANT_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `VERDANT_CACHE_TTL_SECS` - Catalog cache TTL, 0 disables caching (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN (CLI only)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default remote API base.
pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api/v1";

const DEFAULT_DATA_DIR: &str = ".verdant";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Remote API base, without trailing slash.
    pub api_base: String,
    /// Base for resolving relative image references, without trailing slash.
    pub asset_base: String,
    /// Directory backing the file store.
    pub data_dir: PathBuf,
    /// HTTP request timeout.
    pub http_timeout: Duration,
    /// TTL for cached catalog reads; `None` disables the cache.
    pub cache_ttl: Option<Duration>,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Build a configuration for the given API base with all other values defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` (keyed as `VERDANT_API_BASE`) if the
    /// base is not an absolute http(s) URL.
    pub fn new(api_base: &str) -> Result<Self, ConfigError> {
        let api_base = normalize_base("VERDANT_API_BASE", api_base)?;
        Ok(Self {
            asset_base: api_base.clone(),
            api_base,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Some(Duration::from_secs(DEFAULT_CACHE_TTL_SECS)),
            sentry_dsn: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let mut config = Self::new(&get_env_or_default("VERDANT_API_BASE", DEFAULT_API_BASE))?;

        if let Some(asset_base) = get_optional_env("VERDANT_ASSET_BASE") {
            config.asset_base = normalize_base("VERDANT_ASSET_BASE", &asset_base)?;
        }
        if let Some(dir) = get_optional_env("VERDANT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        config.http_timeout = Duration::from_secs(get_parsed_env(
            "VERDANT_HTTP_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);
        let ttl = get_parsed_env("VERDANT_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        config.cache_ttl = (ttl > 0).then(|| Duration::from_secs(ttl));
        config.sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(config)
    }

    /// Absolute URL for an API path such as `/get-all-products`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional, non-empty environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an optional numeric environment variable.
fn get_parsed_env(key: &str, default: u64) -> Result<u64, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Validate an absolute http(s) base URL and strip its trailing slash.
fn normalize_base(key: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(trimmed.to_string())
}
