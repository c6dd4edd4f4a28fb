//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use anyhow::bail;

/// Which shared store holds the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Redis,
    /// Per-process counters; every server instance limits independently.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown RATE_LIMIT_BACKEND '{other}' (expected postgres, redis or memory)"),
        }
    }
}

/// What the middleware does when the limiter itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Reject the request with 503.
    #[default]
    Closed,
    /// Let the request through unmetered.
    Open,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "closed" => Ok(Self::Closed),
            "open" => Ok(Self::Open),
            other => bail!("unknown RATE_LIMIT_FAILURE_MODE '{other}' (expected open or closed)"),
        }
    }
}

/// Limit applied by the rate limit middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
    pub failure_policy: FailurePolicy,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
            failure_policy: FailurePolicy::Closed,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub rate_limit: RateLimitSettings,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from any variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = var("DATABASE_URL");

        // Explicit choice wins; otherwise prefer the strongest shared store configured.
        let backend = match var("RATE_LIMIT_BACKEND") {
            Some(name) => name.parse()?,
            None if database_url.is_some() => StoreBackend::Postgres,
            None if var("REDIS_URL").is_some() => StoreBackend::Redis,
            None => StoreBackend::Memory,
        };

        let defaults = RateLimitSettings::default();
        let rate_limit = RateLimitSettings {
            max_requests: var("RATE_LIMIT_MAX_REQUESTS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_requests),
            window_secs: var("RATE_LIMIT_WINDOW_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.window_secs),
            failure_policy: match var("RATE_LIMIT_FAILURE_MODE") {
                Some(mode) => mode.parse()?,
                None => defaults.failure_policy,
            },
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: var("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
            backend,
            database_url,
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            db_min_connections: var("DB_MIN_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            rate_limit,
        })
    }
}
