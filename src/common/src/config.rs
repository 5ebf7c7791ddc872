//! Configuration loading from environment variables.

use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Ledger node API base URL
    pub ledger_api_url: String,

    /// Reconciler poll interval in seconds
    pub sync_interval_secs: u64,

    /// Per-request timeout for ledger fetches in seconds
    pub ledger_timeout_secs: u64,

    /// Maximum connections in the database pool
    pub db_max_connections: u32,

    /// Timeout for acquiring a pooled connection in seconds
    pub db_acquire_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - DATABASE_URL: PostgreSQL connection string
    ///
    /// Optional variables (with defaults):
    /// - LEDGER_API_URL: Ledger node API base URL
    /// - SYNC_INTERVAL_SECS: Reconciler poll interval (default: 60)
    /// - LEDGER_TIMEOUT_SECS: Per-request ledger timeout (default: 10)
    /// - DB_MAX_CONNECTIONS: Database pool size (default: 10)
    /// - DB_ACQUIRE_TIMEOUT_SECS: Pool acquire timeout (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_env_only()
    }

    /// Load configuration from environment variables only (no .env file).
    /// Useful for testing.
    pub fn from_env_only() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let ledger_api_url = env::var("LEDGER_API_URL")
            .unwrap_or_else(|_| "https://node.augurion.io".to_string());

        let sync_interval_secs = parse_var("SYNC_INTERVAL_SECS", 60)?;
        let ledger_timeout_secs = parse_var("LEDGER_TIMEOUT_SECS", 10)?;
        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", 10)?;
        let db_acquire_timeout_secs = parse_var("DB_ACQUIRE_TIMEOUT_SECS", 5)?;

        Ok(Self {
            database_url,
            ledger_api_url,
            sync_interval_secs,
            ledger_timeout_secs,
            db_max_connections,
            db_acquire_timeout_secs,
        })
    }
}

/// Parse an optional numeric variable, rejecting malformed values.
///
/// A missing variable falls back to the default; a present but unparseable
/// one is a configuration error, not something to silently paper over.
fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_optional_vars() {
        env::remove_var("LEDGER_API_URL");
        env::remove_var("SYNC_INTERVAL_SECS");
        env::remove_var("LEDGER_TIMEOUT_SECS");
        env::remove_var("DB_MAX_CONNECTIONS");
        env::remove_var("DB_ACQUIRE_TIMEOUT_SECS");
    }

    #[test]
    #[serial]
    fn test_config_missing_database_url() {
        // Clear DATABASE_URL if set
        env::remove_var("DATABASE_URL");

        // Use from_env_only to avoid .env file loading
        let result = Config::from_env_only();
        assert!(result.is_err());

        if let Err(ConfigError::MissingVar(var)) = result {
            assert_eq!(var, "DATABASE_URL");
        } else {
            panic!("Expected MissingVar error");
        }
    }

    #[test]
    #[serial]
    fn test_config_with_defaults() {
        env::set_var("DATABASE_URL", "postgres://localhost/test");
        clear_optional_vars();

        // Use from_env_only to test just env vars
        let config = Config::from_env_only().unwrap();

        assert_eq!(config.database_url, "postgres://localhost/test");
        assert_eq!(config.ledger_api_url, "https://node.augurion.io");
        assert_eq!(config.sync_interval_secs, 60);
        assert_eq!(config.ledger_timeout_secs, 10);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.db_acquire_timeout_secs, 5);

        // Cleanup
        env::remove_var("DATABASE_URL");
    }

    #[test]
    #[serial]
    fn test_config_override_interval() {
        env::set_var("DATABASE_URL", "postgres://localhost/test");
        clear_optional_vars();
        env::set_var("SYNC_INTERVAL_SECS", "15");

        let config = Config::from_env_only().unwrap();
        assert_eq!(config.sync_interval_secs, 15);

        env::remove_var("DATABASE_URL");
        env::remove_var("SYNC_INTERVAL_SECS");
    }

    #[test]
    #[serial]
    fn test_config_rejects_malformed_interval() {
        env::set_var("DATABASE_URL", "postgres://localhost/test");
        clear_optional_vars();
        env::set_var("SYNC_INTERVAL_SECS", "sixty");

        let result = Config::from_env_only();
        if let Err(ConfigError::InvalidValue(var, raw)) = result {
            assert_eq!(var, "SYNC_INTERVAL_SECS");
            assert_eq!(raw, "sixty");
        } else {
            panic!("Expected InvalidValue error, got {result:?}");
        }

        env::remove_var("DATABASE_URL");
        env::remove_var("SYNC_INTERVAL_SECS");
    }

    #[test]
    #[serial]
    fn test_config_rejects_malformed_pool_size() {
        env::set_var("DATABASE_URL", "postgres://localhost/test");
        clear_optional_vars();
        env::set_var("DB_MAX_CONNECTIONS", "-1");

        let result = Config::from_env_only();
        assert!(matches!(result, Err(ConfigError::InvalidValue(_, _))));

        env::remove_var("DATABASE_URL");
        env::remove_var("DB_MAX_CONNECTIONS");
    }
}
