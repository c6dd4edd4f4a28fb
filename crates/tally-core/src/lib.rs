//! # Tally Core
//!
//! The domain layer of the Tally rate limiter.
//! This crate contains the fixed-window policy, the limiter facade and the
//! ports that storage backends implement. It has zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod limiter;
pub mod ports;

pub use domain::{CounterRecord, FixedWindow, RateLimitDecision, WindowState};
pub use error::{RateLimitError, StoreError};
pub use limiter::FixedWindowLimiter;
