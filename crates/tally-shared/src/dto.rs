//! Data Transfer Objects - rate limit state as seen by clients.

use serde::{Deserialize, Serialize};

/// Rate limit state of the client's key after the current request.
///
/// Mirrors the `X-RateLimit-*` response headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp (seconds) at which the window resets.
    pub reset: i64,
}
