//! # Tally Shared
//!
//! Wire types shared between the API server and its HTTP clients.

pub mod dto;
pub mod response;

pub use dto::RateLimitStatus;
pub use response::ErrorResponse;
