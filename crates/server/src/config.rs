//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LEDGER_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `LEDGER_HOST` - Bind address (default: 127.0.0.1)
//! - `LEDGER_PORT` - Listen port (default: 3000)
//! - `LEDGER_CATALOG_URL` - Indexed catalog endpoint
//! - `LEDGER_IMAGE_CDN_URL` - Base URL for card images
//! - `LEDGER_CACHE_DIR` - Directory for the persisted catalog snapshot (default: .cache)
//! - `LEDGER_CATALOG_MAX_AGE_HOURS` - Catalog freshness window (default: 24)
//! - `LEDGER_CATALOG_TIMEOUT_SECS` - Catalog request timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_CATALOG_URL: &str = "https://api.dotgg.gg/cgfw/getcards?game=onepiece&mode=indexed";
const DEFAULT_IMAGE_CDN_URL: &str = "https://static.dotgg.gg/onepiece/card";
const MAX_CATALOG_AGE_HOURS: u64 = 24 * 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Catalog source and cache settings
    pub catalog: CatalogConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// Catalog source and cache settings.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Indexed catalog endpoint.
    pub url: Url,
    /// Base URL for card images; `<base>/<normalized id>.webp`.
    pub image_cdn_url: Url,
    /// Directory holding the persisted snapshot.
    pub cache_dir: PathBuf,
    /// How long a snapshot stays fresh.
    pub max_age: Duration,
    /// Request timeout for catalog fetches.
    pub request_timeout: Duration,
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("LEDGER_DATABASE_URL")?;
        let host = get_env_or_default("LEDGER_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("LEDGER_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("LEDGER_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("LEDGER_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            database_url,
            host,
            port,
            catalog: CatalogConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CatalogConfig {
    /// Load catalog settings from environment variables.
    ///
    /// Used by the CLI as well, which has no database URL of its own.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = parse_url(
            "LEDGER_CATALOG_URL",
            &get_env_or_default("LEDGER_CATALOG_URL", DEFAULT_CATALOG_URL),
        )?;
        let image_cdn_url = parse_url(
            "LEDGER_IMAGE_CDN_URL",
            &get_env_or_default("LEDGER_IMAGE_CDN_URL", DEFAULT_IMAGE_CDN_URL),
        )?;
        let cache_dir = PathBuf::from(get_env_or_default("LEDGER_CACHE_DIR", ".cache"));

        let max_age_hours = parse_bounded(
            "LEDGER_CATALOG_MAX_AGE_HOURS",
            &get_env_or_default("LEDGER_CATALOG_MAX_AGE_HOURS", "24"),
            1,
            MAX_CATALOG_AGE_HOURS,
        )?;
        let timeout_secs = parse_bounded(
            "LEDGER_CATALOG_TIMEOUT_SECS",
            &get_env_or_default("LEDGER_CATALOG_TIMEOUT_SECS", "10"),
            1,
            300,
        )?;

        Ok(Self {
            url,
            image_cdn_url,
            cache_dir,
            max_age: Duration::from_secs(max_age_hours * 3600),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an absolute http(s) URL.
fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Parse an integer within `[min, max]`.
fn parse_bounded(key: &str, raw: &str, min: u64, max: u64) -> Result<u64, ConfigError> {
    let value = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(min..=max).contains(&value) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between {min} and {max} (got {value})"),
        ));
    }
    Ok(value)
}
