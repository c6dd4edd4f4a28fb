//! Limiter facade - turns one atomic store hit into a caller-facing decision.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{FixedWindow, RateLimitDecision};
use crate::error::RateLimitError;
use crate::ports::{Clock, CounterStore, RateLimiter, SystemClock};

/// Fixed-window rate limiter over a shared counter store.
///
/// Holds no per-key state of its own. Every call is exactly one store round
/// trip, so any number of limiter instances, in any number of processes, may
/// share one store.
#[derive(Clone)]
pub struct FixedWindowLimiter {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn rate_limit(
        &self,
        key: &str,
        limit: u32,
        window_secs: u64,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let window = FixedWindow::from_secs(window_secs);
        let now = self.clock.now();

        // Reject unrepresentable windows before a unit is consumed.
        window.end_from(now)?;

        let record = self.store.hit(key, now, window).await?;
        let decision = RateLimitDecision::from_record(&record, limit);

        tracing::debug!(
            key = %key,
            count = record.count,
            limit,
            success = decision.success,
            backend = self.store.backend(),
            "Rate limit evaluated"
        );

        Ok(decision)
    }

    fn backend(&self) -> &'static str {
        self.store.backend()
    }
}
