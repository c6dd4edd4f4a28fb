//! Domain-level error types.

use thiserror::Error;

/// Counter store errors.
///
/// Every variant means the atomic write did not produce a usable record;
/// callers must not assume the hit was or was not counted.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Store write failed: {0}")]
    Query(String),

    #[error("Corrupt counter record: {0}")]
    Corrupt(String),

    /// Caller passed a window the store cannot represent; nothing was written.
    #[error("Window of {seconds}s cannot be stored")]
    InvalidWindow { seconds: u64 },
}

/// Limiter facade errors.
#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Window of {seconds}s overflows the timestamp range")]
    WindowOverflow { seconds: u64 },
}
