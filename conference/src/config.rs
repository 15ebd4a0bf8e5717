//! Configuration management for Conference Central.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unknown backend names and unparsable numbers are errors rather than
//! silently falling back to a default.

use conference_runtime::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while reading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Environment variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// A selected backend needs a variable that is not set
    #[error("{var} is required when {backend} is selected")]
    Missing {
        /// Environment variable name
        var: &'static str,
        /// Backend that needs it
        backend: &'static str,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Record store configuration
    pub store: StoreConfig,
    /// Announcement cache and task queue configuration
    pub cache: CacheConfig,
    /// Registration retry configuration
    pub registration: RegistrationConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Metrics server port (for Prometheus scraping)
    pub metrics_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Where records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process memory (lost on restart)
    Memory,
    /// `PostgreSQL`
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(()),
        }
    }
}

/// Where the announcement cache and the task queue live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process memory
    Memory,
    /// `Redis`
    Redis,
}

impl FromStr for CacheBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            _ => Err(()),
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Selected backend
    pub backend: StoreBackend,
    /// `PostgreSQL` connection URL (postgres backend only)
    pub database_url: Option<String>,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

/// Cache and task queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Selected backend
    pub backend: CacheBackend,
    /// `Redis` connection URL
    pub redis_url: String,
    /// Queue receiving confirmation email tasks
    pub task_queue_name: String,
}

/// Retry configuration for optimistic registration commits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,
}

impl RegistrationConfig {
    /// Backoff policy for version conflicts
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(self.max_retries)
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
            .max_delay(Duration::from_secs(1))
            .build()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value or
    /// the postgres backend is selected without `DATABASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let store_backend = vars.parse("STORE_BACKEND", StoreBackend::Memory)?;
        let database_url = vars.get("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing {
                var: "DATABASE_URL",
                backend: "STORE_BACKEND=postgres",
            });
        }

        Ok(Self {
            server: ServerConfig {
                host: vars.get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: vars.parse("PORT", 8080)?,
                metrics_port: vars.parse("METRICS_PORT", 9090)?,
                shutdown_timeout: vars.parse("SHUTDOWN_TIMEOUT", 30)?,
            },
            store: StoreConfig {
                backend: store_backend,
                database_url,
                max_connections: vars.parse("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            cache: CacheConfig {
                backend: vars.parse("CACHE_BACKEND", CacheBackend::Memory)?,
                redis_url: vars
                    .get("REDIS_URL")
                    .unwrap_or_else(|| "redis://localhost:6379".to_string()),
                task_queue_name: vars
                    .get("TASK_QUEUE_NAME")
                    .unwrap_or_else(|| "default".to_string()),
            },
            registration: RegistrationConfig {
                max_retries: vars.parse("REGISTRATION_MAX_RETRIES", 10)?,
                initial_delay_ms: vars.parse("REGISTRATION_RETRY_INITIAL_DELAY_MS", 10)?,
            },
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, var: &str) -> Option<String> {
        (self.0)(var).filter(|value| !value.trim().is_empty())
    }

    fn parse<T: FromStr>(&self, var: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(var) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { var, value }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_use_in_memory_backends() {
        let config = load(&[]).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.metrics_port, 9090);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.task_queue_name, "default");
        assert_eq!(config.registration.max_retries, 10);
    }

    #[test]
    fn postgres_backend_needs_database_url() {
        assert_eq!(
            load(&[("STORE_BACKEND", "postgres")]).unwrap_err(),
            ConfigError::Missing {
                var: "DATABASE_URL",
                backend: "STORE_BACKEND=postgres",
            }
        );

        let config = load(&[
            ("STORE_BACKEND", "Postgres"),
            ("DATABASE_URL", "postgres://localhost/conference"),
        ])
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Postgres);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert_eq!(
            load(&[("PORT", "eighty")]).unwrap_err(),
            ConfigError::InvalidValue {
                var: "PORT",
                value: "eighty".to_string(),
            }
        );
        assert!(load(&[("CACHE_BACKEND", "memcache")]).is_err());
    }

    #[test]
    fn registration_policy_follows_config() {
        let config = load(&[
            ("REGISTRATION_MAX_RETRIES", "4"),
            ("REGISTRATION_RETRY_INITIAL_DELAY_MS", "25"),
        ])
        .unwrap();
        let policy = config.registration.retry_policy();
        assert_eq!(policy.max_retries, 4);
        assert_eq!(policy.initial_delay, Duration::from_millis(25));
    }
}
