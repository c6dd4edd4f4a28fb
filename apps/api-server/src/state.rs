//! Application state - shared across all handlers.

use std::sync::Arc;

use tally_core::FixedWindowLimiter;
use tally_core::ports::{CounterStore, RateLimiter};
use tally_infra::InMemoryCounterStore;

use crate::config::{AppConfig, RateLimitSettings, StoreBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<dyn RateLimiter>,
    pub rate_limit: RateLimitSettings,
}

impl AppState {
    /// Build the application state with the configured counter store.
    ///
    /// A configured shared store that cannot be reached is a start-up error:
    /// silently degrading to per-process counters would multiply the
    /// effective limit by the number of running instances.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn CounterStore> = match config.backend {
            StoreBackend::Postgres => postgres_store(config).await?,
            StoreBackend::Redis => redis_store().await?,
            StoreBackend::Memory => {
                tracing::warn!(
                    "Using in-memory counters. Limits are per-process, not shared across instances."
                );
                Arc::new(InMemoryCounterStore::new())
            }
        };

        tracing::info!(
            backend = store.backend(),
            max_requests = config.rate_limit.max_requests,
            window_secs = config.rate_limit.window_secs,
            failure_policy = ?config.rate_limit.failure_policy,
            "Application state initialized"
        );

        Ok(Self::with_limiter(
            Arc::new(FixedWindowLimiter::new(store)),
            config.rate_limit,
        ))
    }

    pub fn with_limiter(limiter: Arc<dyn RateLimiter>, rate_limit: RateLimitSettings) -> Self {
        Self {
            limiter,
            rate_limit,
        }
    }
}

#[cfg(feature = "postgres")]
async fn postgres_store(config: &AppConfig) -> anyhow::Result<Arc<dyn CounterStore>> {
    use anyhow::Context;
    use tally_infra::{DatabaseConfig, DatabaseConnections, PostgresCounterStore};

    let url = config
        .database_url
        .clone()
        .context("DATABASE_URL must be set for the postgres backend")?;

    let mut db_config = DatabaseConfig::new(url);
    db_config.max_connections = config.db_max_connections;
    db_config.min_connections = config.db_min_connections;

    let connections = DatabaseConnections::init(&db_config)
        .await
        .context("Failed to connect to the counter database")?;

    Ok(Arc::new(PostgresCounterStore::new(connections.main)))
}

#[cfg(not(feature = "postgres"))]
async fn postgres_store(_config: &AppConfig) -> anyhow::Result<Arc<dyn CounterStore>> {
    anyhow::bail!("postgres backend requested but the server was built without the postgres feature")
}

#[cfg(feature = "redis")]
async fn redis_store() -> anyhow::Result<Arc<dyn CounterStore>> {
    use anyhow::Context;
    use tally_infra::RedisCounterStore;

    let store = RedisCounterStore::from_env()
        .await
        .context("Failed to connect to the Redis counter store")?;

    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
async fn redis_store() -> anyhow::Result<Arc<dyn CounterStore>> {
    anyhow::bail!("redis backend requested but the server was built without the redis feature")
}
