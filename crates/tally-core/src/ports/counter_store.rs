use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CounterRecord, FixedWindow};
use crate::error::StoreError;

/// Counter store - the shared table of per-key counters.
///
/// There is deliberately no read method: a read followed by a write would
/// reopen the race that `hit` closes.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Count one hit for `key` as a single atomic conditional write.
    ///
    /// Creates `{count: 1, expires_at: now + window}` when the key is absent
    /// or its window has lapsed at `now`, otherwise increments `count` and
    /// keeps `expires_at`. Returns the record as written by this call.
    /// Concurrent hits on one key are linearized by the store.
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: FixedWindow,
    ) -> Result<CounterRecord, StoreError>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
