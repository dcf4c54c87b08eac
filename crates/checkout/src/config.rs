//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHECKOUT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `CHECKOUT_DB_MAX_CONNECTIONS` - Pool ceiling (default: 10)
//! - `CHECKOUT_DB_MIN_CONNECTIONS` - Idle connections kept open (default: 2)
//! - `CHECKOUT_DB_ACQUIRE_TIMEOUT_SECS` - Seconds to wait for a connection (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout layer configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Connection pool sizing
    pub pool: PoolConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// Connection pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum open connections.
    pub max_connections: u32,
    /// Minimum idle connections.
    pub min_connections: u32,
    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

impl CheckoutConfig {
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

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get_database_url(&lookup, "CHECKOUT_DATABASE_URL")?;

        let defaults = PoolConfig::default();
        let max_connections = get_parsed_or(
            &lookup,
            "CHECKOUT_DB_MAX_CONNECTIONS",
            defaults.max_connections,
        )?;
        let min_connections = get_parsed_or(
            &lookup,
            "CHECKOUT_DB_MIN_CONNECTIONS",
            defaults.min_connections,
        )?;
        let acquire_timeout_secs = get_parsed_or(
            &lookup,
            "CHECKOUT_DB_ACQUIRE_TIMEOUT_SECS",
            defaults.acquire_timeout.as_secs(),
        )?;

        if max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CHECKOUT_DB_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if min_connections > max_connections {
            return Err(ConfigError::InvalidEnvVar(
                "CHECKOUT_DB_MIN_CONNECTIONS".to_string(),
                format!("must not exceed CHECKOUT_DB_MAX_CONNECTIONS ({max_connections})"),
            ));
        }

        Ok(Self {
            database_url,
            pool: PoolConfig {
                max_connections,
                min_connections,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            },
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT").filter(|v| !v.is_empty()),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url<F>(lookup: &F, primary_key: &str) -> Result<SecretString, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(primary_key)
        .or_else(|| lookup("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Parse an optional variable, falling back to a default when unset.
fn get_parsed_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            CheckoutConfig::from_lookup(lookup_from(&[("CHECKOUT_DATABASE_URL", "postgres://x")]))
                .unwrap();

        assert_eq!(config.database_url.expose_secret(), "postgres://x");
        assert_eq!(config.pool, PoolConfig::default());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        let result = CheckoutConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(key)) if key == "CHECKOUT_DATABASE_URL"));
    }

    #[test]
    fn test_falls_back_to_database_url() {
        let config =
            CheckoutConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://fallback")]))
                .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback");
    }

    #[test]
    fn test_pool_overrides() {
        let config = CheckoutConfig::from_lookup(lookup_from(&[
            ("CHECKOUT_DATABASE_URL", "postgres://x"),
            ("CHECKOUT_DB_MAX_CONNECTIONS", "4"),
            ("CHECKOUT_DB_MIN_CONNECTIONS", "1"),
            ("CHECKOUT_DB_ACQUIRE_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.pool.max_connections, 4);
        assert_eq!(config.pool.min_connections, 1);
        assert_eq!(config.pool.acquire_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_number() {
        let result = CheckoutConfig::from_lookup(lookup_from(&[
            ("CHECKOUT_DATABASE_URL", "postgres://x"),
            ("CHECKOUT_DB_MAX_CONNECTIONS", "many"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "CHECKOUT_DB_MAX_CONNECTIONS"));
    }

    #[test]
    fn test_min_above_max_rejected() {
        let result = CheckoutConfig::from_lookup(lookup_from(&[
            ("CHECKOUT_DATABASE_URL", "postgres://x"),
            ("CHECKOUT_DB_MAX_CONNECTIONS", "2"),
            ("CHECKOUT_DB_MIN_CONNECTIONS", "5"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = CheckoutConfig::from_lookup(lookup_from(&[(
            "CHECKOUT_DATABASE_URL",
            "postgres://user:hunter2@db/checkout",
        )]))
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }

    #[test]
    fn test_empty_sentry_dsn_is_none() {
        let config = CheckoutConfig::from_lookup(lookup_from(&[
            ("CHECKOUT_DATABASE_URL", "postgres://x"),
            ("SENTRY_DSN", ""),
        ]))
        .unwrap();
        assert!(config.sentry_dsn.is_none());
    }
}
