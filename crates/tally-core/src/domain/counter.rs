use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counter record - the persisted usage of one key within its current window.
///
/// A key that has never been hit has no record, which is equivalent to a
/// count of zero with no window started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    pub key: String,
    /// Units consumed in the current window, including denied attempts.
    pub count: u64,
    /// Exclusive end of the current window.
    pub expires_at: DateTime<Utc>,
}

impl CounterRecord {
    /// Record for the first hit of a fresh window.
    pub fn first_hit(key: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            count: 1,
            expires_at,
        }
    }
}
