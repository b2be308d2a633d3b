//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `WOOCOMMERCE_URL` - Store root URL (e.g., `https://shop.example.com`)
//! - `WOOCOMMERCE_CONSUMER_KEY` - REST API consumer key
//! - `WOOCOMMERCE_CONSUMER_SECRET` - REST API consumer secret
//!
//! ## Optional
//! - `WOO_BRIDGE_HOST` - Bind address (default: 127.0.0.1)
//! - `WOO_BRIDGE_PORT` - Listen port (default: 8000)
//! - `WOOCOMMERCE_API_VERSION` - REST namespace (default: wc/v3)
//! - `WOOCOMMERCE_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;
const DEFAULT_API_VERSION: &str = "wc/v3";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Values people leave in `.env` files instead of real credentials.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    pub woocommerce: WooCommerceConfig,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// WooCommerce REST API credentials and transport settings.
///
/// Implements `Debug` manually to redact the credentials.
#[derive(Clone)]
pub struct WooCommerceConfig {
    /// Store root URL, without the `/wp-json` suffix.
    pub store_url: Url,
    pub consumer_key: SecretString,
    pub consumer_secret: SecretString,
    /// REST namespace, e.g. `wc/v3`.
    pub api_version: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for WooCommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooCommerceConfig")
            .field("store_url", &self.store_url.as_str())
            .field("consumer_key", &"[REDACTED]")
            .field("consumer_secret", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if a credential looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(get_required_env("DATABASE_URL")?);
        let host = parse_env("WOO_BRIDGE_HOST", "127.0.0.1")?;
        let port = parse_env("WOO_BRIDGE_PORT", "8000")?;
        let woocommerce = WooCommerceConfig::from_env()?;

        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            woocommerce,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl WooCommerceConfig {
    /// Load the WooCommerce section on its own.
    ///
    /// The CLI uses this for `mirror push`, which needs the store but not the
    /// HTTP listener settings.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ServerConfig::from_env`] for the `WOOCOMMERCE_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let store_url = parse_store_url(&get_required_env("WOOCOMMERCE_URL")?)?;

        let consumer_key = get_required_env("WOOCOMMERCE_CONSUMER_KEY")?;
        reject_placeholder(&consumer_key, "WOOCOMMERCE_CONSUMER_KEY")?;

        let consumer_secret = get_required_env("WOOCOMMERCE_CONSUMER_SECRET")?;
        validate_secret_strength(&consumer_secret, "WOOCOMMERCE_CONSUMER_SECRET")?;

        let timeout_secs: u64 = parse_env(
            "WOOCOMMERCE_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )?;

        Ok(Self {
            store_url,
            consumer_key: SecretString::from(consumer_key),
            consumer_secret: SecretString::from(consumer_secret),
            api_version: get_env_or_default("WOOCOMMERCE_API_VERSION", DEFAULT_API_VERSION),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Read an optional variable and parse it, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// The store must be an absolute http(s) URL.
fn parse_store_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("WOOCOMMERCE_URL".to_string(), msg);

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.has_host() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Credential length never approaches f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

fn reject_placeholder(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }
    Ok(())
}

/// Placeholder check plus a minimum entropy for generated secrets.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    reject_placeholder(secret, var_name)?;

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!(shannon_entropy("aaaaaaa").abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_real_looking_consumer_secret_passes() {
        let secret = "cs_9f1c2b7e4a6d8f0e3b5c7a9d1e2f4a6b8c0d2e4f";
        assert!(validate_secret_strength(secret, "TEST").is_ok());
    }

    #[test]
    fn test_placeholders_are_rejected() {
        for value in ["your-consumer-secret", "ck_changeme", "cs_xxxxxxxxxxxx"] {
            let err = validate_secret_strength(value, "TEST").unwrap_err();
            assert!(matches!(err, ConfigError::InsecureSecret(_, _)), "{value}");
        }
    }

    #[test]
    fn test_low_entropy_secret_is_rejected() {
        let err = validate_secret_strength("cs_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST").unwrap_err();
        assert!(err.to_string().contains("entropy too low"));
    }

    #[test]
    fn test_store_url_rules() {
        assert!(parse_store_url("https://shop.example.com").is_ok());
        assert!(parse_store_url(" http://localhost:8080/store ").is_ok());
        assert!(parse_store_url("ftp://shop.example.com").is_err());
        assert!(parse_store_url("shop.example.com").is_err());
    }

    #[test]
    fn test_config_debug_redacts_credentials() {
        let config = WooCommerceConfig {
            store_url: Url::parse("https://shop.example.com").unwrap(),
            consumer_key: SecretString::from("ck_live_key_value"),
            consumer_secret: SecretString::from("cs_live_secret_value"),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("ck_live_key_value"));
        assert!(!debug.contains("cs_live_secret_value"));
    }
}
