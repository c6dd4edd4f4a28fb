//! In-memory counter store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use tally_core::ports::CounterStore;
use tally_core::{CounterRecord, FixedWindow, StoreError};

/// In-memory counter store using a HashMap behind an async mutex.
///
/// The window policy runs entirely inside one lock acquisition, which makes
/// each hit atomic within this process.
/// Note: Counters are per-process, not shared across instances, and are lost on restart.
pub struct InMemoryCounterStore {
    records: Mutex<HashMap<String, CounterRecord>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: FixedWindow,
    ) -> Result<CounterRecord, StoreError> {
        let mut records = self.records.lock().await;

        let next = window
            .advance(key, records.get(key), now)
            .map_err(|_| StoreError::InvalidWindow {
                seconds: window.seconds(),
            })?;
        records.insert(key.to_string(), next.clone());

        Ok(next)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
