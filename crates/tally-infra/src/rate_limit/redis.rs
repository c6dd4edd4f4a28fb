//! Redis counter store - one hash per key, updated by a Lua script.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{Client, Script};

use tally_core::ports::CounterStore;
use tally_core::{CounterRecord, FixedWindow, StoreError};

/// Window policy as a script. Redis runs scripts one at a time, so the
/// read of `expires_at` and the write that follows cannot interleave with
/// another hit.
///
/// KEYS[1] counter hash, ARGV[1] now (ms), ARGV[2] end of a window opened now (ms).
/// Returns: [count, expires_at_ms]
const HIT_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local fresh_expiry = tonumber(ARGV[2])

local expires_at = nil
local raw = redis.call('HGET', key, 'expires_at')
if raw then
    expires_at = tonumber(raw)
end

if expires_at == nil or expires_at <= now then
    redis.call('HSET', key, 'count', 1, 'expires_at', fresh_expiry)
    return {1, fresh_expiry}
end

local count = redis.call('HINCRBY', key, 'count', 1)
return {count, expires_at}
"#;

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Namespace for counter keys
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            key_prefix: "ratelimit".to_string(),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            connect_timeout: std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            key_prefix: std::env::var("RATE_LIMIT_KEY_PREFIX").unwrap_or(defaults.key_prefix),
        }
    }
}

/// Redis-backed counter store.
///
/// Counters are never given a TTL; a lapsed window is reset in place by the
/// next hit, exactly like the relational store.
pub struct RedisCounterStore {
    conn: ConnectionManager,
    config: RedisConfig,
    script: Script,
}

impl RedisCounterStore {
    pub async fn new(config: RedisConfig) -> Result<Self, StoreError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new(client);
        let conn = tokio::time::timeout(config.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| StoreError::Connection("Connection timed out".to_string()))?
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis counter store");

        Ok(Self {
            conn,
            config,
            script: Script::new(HIT_SCRIPT),
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, StoreError> {
        Self::new(RedisConfig::from_env()).await
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }
}

fn map_redis_err(err: redis::RedisError) -> StoreError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
        StoreError::Connection(err.to_string())
    } else {
        StoreError::Query(err.to_string())
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: FixedWindow,
    ) -> Result<CounterRecord, StoreError> {
        let fresh_expiry = window
            .end_from(now)
            .map_err(|_| StoreError::InvalidWindow {
                seconds: window.seconds(),
            })?;
        let mut conn = self.conn.clone();

        let (count, expires_at_ms): (i64, i64) = self
            .script
            .key(self.make_key(key))
            .arg(now.timestamp_millis())
            .arg(fresh_expiry.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_err)?;

        let count = u64::try_from(count)
            .map_err(|_| StoreError::Corrupt(format!("negative count {count} for key {key}")))?;
        let expires_at = DateTime::from_timestamp_millis(expires_at_ms).ok_or_else(|| {
            StoreError::Corrupt(format!("expiry {expires_at_ms}ms out of range for key {key}"))
        })?;

        tracing::trace!(key = %key, count, "Redis counter hit");

        Ok(CounterRecord {
            key: key.to_string(),
            count,
            expires_at,
        })
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
