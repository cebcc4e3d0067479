//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use meksikaner::{db::DatabaseConfig, table::SessionConfig};
use std::{fmt, net::SocketAddr, str::FromStr};

const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Which session store backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::Invalid {
                var: "STORE_BACKEND".to_string(),
                reason: format!("Unknown backend {other:?}, expected postgres or memory"),
            }),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Postgres => write!(f, "postgres"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration, unused with the memory backend
    pub database: DatabaseConfig,
    /// Game actor settings
    pub session: SessionConfig,
    /// Prometheus exporter address, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    pub store: StoreBackend,
}

/// Values given on the command line, which win over the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub memory: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `overrides` - Values parsed from CLI args
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_env_strict("SERVER_BIND", DEFAULT_BIND)?,
        };

        let store = if overrides.memory {
            StoreBackend::Memory
        } else {
            match std::env::var("STORE_BACKEND") {
                Ok(value) => value.parse()?,
                Err(_) => StoreBackend::default(),
            }
        };

        let defaults = DatabaseConfig::development();
        let database_url = overrides
            .database_url
            .or_else(|| std::env::var("DATABASE_URL").ok());

        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingRequired {
                var: "DATABASE_URL".to_string(),
                hint: "Pass --db-url, or run with --memory for a throwaway store".to_string(),
            });
        }

        let database = DatabaseConfig {
            database_url: database_url.unwrap_or(defaults.database_url),
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", defaults.min_connections),
            connection_timeout_secs: parse_env_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        };

        let session_defaults = SessionConfig::default();
        let session = SessionConfig {
            auto_deal: parse_env_or("SESSION_AUTO_DEAL", session_defaults.auto_deal),
            channel_capacity: parse_env_or(
                "SESSION_CHANNEL_CAPACITY",
                session_defaults.channel_capacity,
            ),
        };

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(value) => Some(value.parse().map_err(|_| ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("{value:?} is not a socket address"),
            })?),
            Err(_) => None,
        };

        Ok(ServerConfig {
            bind,
            database,
            session,
            metrics_bind,
            store,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "SESSION_CHANNEL_CAPACITY".to_string(),
                reason,
            })?;

        if self.store == StoreBackend::Postgres {
            self.database
                .validate()
                .map_err(|reason| ConfigError::Invalid {
                    var: "DB_*".to_string(),
                    reason,
                })?;
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like `parse_env_or`, but a set-and-malformed value is an error
fn parse_env_strict<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("Cannot parse {raw:?}"),
    })
}
