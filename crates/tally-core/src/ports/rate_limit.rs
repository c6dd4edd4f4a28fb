//! Rate limiting port.

use async_trait::async_trait;

use crate::domain::RateLimitDecision;
use crate::error::RateLimitError;

/// Rate limiter trait - the entry point HTTP handlers call.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Consume one unit of quota for `key` and report whether it was within `limit`.
    ///
    /// Denied calls consume quota too. Store failures are returned as-is;
    /// whether to then admit or reject the request is the caller's policy.
    async fn rate_limit(
        &self,
        key: &str,
        limit: u32,
        window_secs: u64,
    ) -> Result<RateLimitDecision, RateLimitError>;

    /// Name of the backing store.
    fn backend(&self) -> &'static str;
}
