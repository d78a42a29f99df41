//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ZAULIMI_TOKEN_SECRET` - Bearer token signing key (min 32 chars, high entropy)
//!
//! ## Optional
//! - `ZAULIMI_HOST` - Bind address (default: 127.0.0.1)
//! - `ZAULIMI_PORT` - Listen port (default: `PORT`, then 5000)
//! - `ZAULIMI_TOKEN_TTL` - Token lifetime, e.g. `24h`, `90m`, `7d`, `3600` (default: 24h)
//! - `ZAULIMI_CART_IDLE_TTL_HOURS` - Drop carts untouched for this long (default: 720)
//! - `ZAULIMI_CATALOG_TIMEOUT_MS` - Upper bound on a catalog lookup (default: 2000)
//! - `ZAULIMI_CORS_ORIGIN` - Allowed browser origin (default: any)
//! - `ZAULIMI_AUTH_RATE_BURST` - Auth requests allowed per client IP before throttling (default: 5)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_CART_IDLE_TTL_HOURS: u64 = 720;
const DEFAULT_CATALOG_TIMEOUT_MS: u64 = 2000;
const DEFAULT_AUTH_RATE_BURST: u32 = 5;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "fallback",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// HMAC key for signing bearer tokens
    pub token_secret: SecretString,
    /// How long an issued token stays valid
    pub token_ttl: Duration,
    /// Carts not touched for this long are dropped
    pub cart_idle_ttl: Duration,
    /// Upper bound on a single catalog lookup
    pub catalog_timeout: Duration,
    /// Allowed CORS origin; `None` allows any origin
    pub cors_origin: Option<String>,
    /// Burst size for the per-IP auth rate limiter
    pub auth_rate_burst: u32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Build a configuration with defaults for everything but the token secret.
    ///
    /// The secret is not strength-checked here; use [`Self::from_env`] for
    /// production configuration.
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            token_secret,
            token_ttl: DEFAULT_TOKEN_TTL,
            cart_idle_ttl: Duration::from_secs(DEFAULT_CART_IDLE_TTL_HOURS * 60 * 60),
            catalog_timeout: Duration::from_millis(DEFAULT_CATALOG_TIMEOUT_MS),
            cors_origin: None,
            auth_rate_burst: DEFAULT_AUTH_RATE_BURST,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the token secret fails validation (length, placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let token_secret = get_validated_secret("ZAULIMI_TOKEN_SECRET")?;
        validate_secret_length(&token_secret, "ZAULIMI_TOKEN_SECRET")?;

        let host = get_env_or_default("ZAULIMI_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ZAULIMI_HOST".to_string(), e.to_string()))?;

        let port = match get_optional_env("ZAULIMI_PORT").or_else(|| get_optional_env("PORT")) {
            Some(value) => value.parse::<u16>().map_err(|e| {
                ConfigError::InvalidEnvVar("ZAULIMI_PORT".to_string(), e.to_string())
            })?,
            None => DEFAULT_PORT,
        };

        let token_ttl = match get_optional_env("ZAULIMI_TOKEN_TTL") {
            Some(value) => parse_duration(&value)
                .map_err(|e| ConfigError::InvalidEnvVar("ZAULIMI_TOKEN_TTL".to_string(), e))?,
            None => DEFAULT_TOKEN_TTL,
        };

        let cart_idle_hours = get_parsed_or_default::<u64>(
            "ZAULIMI_CART_IDLE_TTL_HOURS",
            DEFAULT_CART_IDLE_TTL_HOURS,
        )?;
        let catalog_timeout_ms =
            get_parsed_or_default::<u64>("ZAULIMI_CATALOG_TIMEOUT_MS", DEFAULT_CATALOG_TIMEOUT_MS)?;

        let auth_rate_burst =
            get_parsed_or_default::<u32>("ZAULIMI_AUTH_RATE_BURST", DEFAULT_AUTH_RATE_BURST)?;
        if auth_rate_burst == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ZAULIMI_AUTH_RATE_BURST".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let sentry_sample_rate = get_parsed_or_default::<f32>("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate =
            get_parsed_or_default::<f32>("SENTRY_TRACES_SAMPLE_RATE", 0.0)?;

        Ok(Self {
            host,
            port,
            token_secret,
            token_ttl,
            cart_idle_ttl: Duration::from_secs(cart_idle_hours.saturating_mul(60 * 60)),
            catalog_timeout: Duration::from_millis(catalog_timeout_ms),
            cors_origin: get_optional_env("ZAULIMI_CORS_ORIGIN"),
            auth_rate_burst,
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

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an optional environment variable, falling back to a default.
fn get_parsed_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
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

/// Parse a lifetime such as `24h`, `90m`, `7d`, `30s`, or bare seconds.
fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let (digits, unit_secs) = match value.char_indices().last() {
        Some((idx, 's')) => (&value[..idx], 1),
        Some((idx, 'm')) => (&value[..idx], 60),
        Some((idx, 'h')) => (&value[..idx], 60 * 60),
        Some((idx, 'd')) => (&value[..idx], 24 * 60 * 60),
        Some(_) => (value, 1),
        None => return Err("duration cannot be empty".to_string()),
    };

    let amount = digits
        .parse::<u64>()
        .map_err(|_| format!("expected a duration like 24h, 90m or 3600, got '{value}'"))?;
    if amount == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    amount
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{value}' is too large"))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("24h").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_duration("90m").unwrap(), Duration::from_secs(5_400));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("3600").unwrap(), Duration::from_secs(3_600));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("0h").is_err());
        assert!(parse_duration("1w").is_err());
        assert!(parse_duration("-5m").is_err());
        assert!(parse_duration("99999999999999999999d").is_err());
    }

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_fallback_secret_is_rejected() {
        // The secret the old Express server fell back to when unset.
        let result = validate_secret_strength("fallback_secret", "ZAULIMI_TOKEN_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_low_entropy_secret_is_rejected() {
        let result = validate_secret_strength(&"ab".repeat(20), "ZAULIMI_TOKEN_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_strong_secret_is_accepted() {
        let secret = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";
        assert!(validate_secret_strength(secret, "ZAULIMI_TOKEN_SECRET").is_ok());
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let secret = SecretString::from("aB3$xY9!");
        let result = validate_secret_length(&secret, "ZAULIMI_TOKEN_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = StorefrontConfig::new(SecretString::from("k".repeat(32)));
        assert_eq!(config.port, 5000);
        assert_eq!(config.token_ttl, DEFAULT_TOKEN_TTL);
        assert_eq!(
            config.socket_addr(),
            "127.0.0.1:5000".parse::<SocketAddr>().unwrap()
        );
    }
}
