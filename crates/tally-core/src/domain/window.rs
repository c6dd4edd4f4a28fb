use chrono::{DateTime, TimeDelta, Utc};

use super::CounterRecord;
use crate::error::RateLimitError;

/// Whether a key's current window still accumulates hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// `now < expires_at`: the next hit increments the count.
    Active,
    /// No record, or `expires_at <= now`: the next hit starts a fresh window.
    Lapsed,
}

/// Fixed-window policy.
///
/// The policy is pure. Stores must evaluate it inside their single atomic
/// write, never as a read followed by a separate conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedWindow {
    seconds: u64,
}

impl FixedWindow {
    pub const fn from_secs(seconds: u64) -> Self {
        Self { seconds }
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Classify a record's window at `now`. `None` means no record exists.
    pub fn state(now: DateTime<Utc>, expires_at: Option<DateTime<Utc>>) -> WindowState {
        match expires_at {
            Some(expires_at) if expires_at > now => WindowState::Active,
            _ => WindowState::Lapsed,
        }
    }

    /// End of a window opened at `now`.
    pub fn end_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, RateLimitError> {
        i64::try_from(self.seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or(RateLimitError::WindowOverflow {
                seconds: self.seconds,
            })
    }

    /// Apply one hit to `existing` and return the record that must replace it.
    ///
    /// For stores that evaluate the policy in process; the caller must hold
    /// exclusive access to the key for the whole read-modify-write.
    pub fn advance(
        &self,
        key: &str,
        existing: Option<&CounterRecord>,
        now: DateTime<Utc>,
    ) -> Result<CounterRecord, RateLimitError> {
        match existing {
            Some(record) if Self::state(now, Some(record.expires_at)) == WindowState::Active => {
                Ok(CounterRecord {
                    key: record.key.clone(),
                    count: record.count.saturating_add(1),
                    expires_at: record.expires_at,
                })
            }
            _ => Ok(CounterRecord::first_hit(key, self.end_from(now)?)),
        }
    }
}
