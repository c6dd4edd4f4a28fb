use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CounterRecord;

/// Caller-facing outcome of one rate-limit call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDecision {
    /// `true` iff the post-write count is within the limit.
    pub success: bool,
    pub limit: u32,
    /// Units left in the current window, never negative.
    pub remaining: u32,
    /// When the window, and with it the count, resets.
    pub reset: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Render the decision for a post-write record.
    pub fn from_record(record: &CounterRecord, limit: u32) -> Self {
        let remaining = u64::from(limit).saturating_sub(record.count);

        Self {
            success: record.count <= u64::from(limit),
            limit,
            // remaining <= limit, so it always fits
            remaining: u32::try_from(remaining).unwrap_or(limit),
            reset: record.expires_at,
        }
    }

    /// Time until the window resets, zero once it has passed.
    pub fn retry_after(&self, now: DateTime<Utc>) -> Duration {
        (self.reset - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Reset instant as Unix seconds, rounded up so clients never retry early.
    pub fn reset_epoch_secs(&self) -> i64 {
        let secs = self.reset.timestamp();
        if self.reset.timestamp_subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}
