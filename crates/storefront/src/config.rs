//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `CATALOG_API_URL` - Base URL of the product API (default: <https://dummyjson.com>)
//! - `CATALOG_API_TOKEN` - Bearer token sent with every catalog request
//! - `CATALOG_PAGE_LIMIT` - Products per page, 1-100 (default: 20)
//! - `CATALOG_SEARCH_DEBOUNCE_MS` - Search quiet period (default: 500)
//! - `CATALOG_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `CATALOG_CACHE_TTL_SECS` - Response cache TTL, 0 disables caching (default: 300)
//! - `CATALOG_NOTICE_TTL_MS` - Auto-dismiss delay of one-shot notices (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "https://dummyjson.com";
const MAX_PAGE_LIMIT: u32 = 100;

/// Configuration errors that can occur during loading.
///
/// Every variable has a default, so only malformed values are errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Catalog API configuration
    pub catalog: CatalogConfig,
    /// List view tuning
    pub listing: ListingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
}

/// Remote catalog API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Base URL, always ending in `/` so relative paths join beneath it
    pub base_url: Url,
    /// Optional bearer token
    pub api_token: Option<SecretString>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Response cache TTL (`Duration::ZERO` disables the cache)
    pub cache_ttl: Duration,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout", &self.request_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

/// Product list behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingConfig {
    /// Products requested per page
    pub page_limit: u32,
    /// Quiet period before a search term is used
    pub search_debounce: Duration,
    /// How long a one-shot notice stays visible
    pub notice_ttl: Duration,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_limit: 20,
            search_debounce: Duration::from_millis(500),
            notice_ttl: Duration::from_millis(3000),
        }
    }
}

impl StorefrontConfig {
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

        Ok(Self {
            catalog: CatalogConfig::from_env()?,
            listing: ListingConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `base_url` with every other setting at its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute URL with a host.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            catalog: CatalogConfig::new(parse_base_url("CATALOG_API_URL", base_url)?),
            listing: ListingConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }
}

impl CatalogConfig {
    /// Catalog configuration with default timeout and cache TTL.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_token: None,
            request_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300),
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url(
            "CATALOG_API_URL",
            &get_env_or_default("CATALOG_API_URL", DEFAULT_API_URL),
        )?;

        Ok(Self {
            base_url,
            api_token: get_optional_env("CATALOG_API_TOKEN").map(SecretString::from),
            request_timeout: Duration::from_secs(get_parsed_env(
                "CATALOG_REQUEST_TIMEOUT_SECS",
                10,
            )?),
            cache_ttl: Duration::from_secs(get_parsed_env("CATALOG_CACHE_TTL_SECS", 300)?),
        })
    }
}

impl ListingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            page_limit: check_page_limit(get_parsed_env("CATALOG_PAGE_LIMIT", 20)?)?,
            search_debounce: Duration::from_millis(get_parsed_env(
                "CATALOG_SEARCH_DEBOUNCE_MS",
                500,
            )?),
            notice_ttl: Duration::from_millis(get_parsed_env("CATALOG_NOTICE_TTL_MS", 3000)?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn get_parsed_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn check_page_limit(page_limit: u32) -> Result<u32, ConfigError> {
    if page_limit == 0 || page_limit > MAX_PAGE_LIMIT {
        return Err(ConfigError::InvalidEnvVar(
            "CATALOG_PAGE_LIMIT".to_string(),
            format!("must be between 1 and {MAX_PAGE_LIMIT} (got {page_limit})"),
        ));
    }
    Ok(page_limit)
}

/// Parse a base URL and make sure it ends in `/`.
///
/// `Url::join` replaces the last path segment unless the base ends in a
/// slash, so `https://host/api` + `products` would otherwise lose `api`.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "URL must have a host".to_string(),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
