//! # Tally Infrastructure
//!
//! Concrete implementations of the `CounterStore` port defined in `tally-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All backends enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL counter table via SeaORM
//! - `redis` - Redis hashes updated by a Lua script

#[cfg(feature = "postgres")]
pub mod database;
pub mod rate_limit;

// Re-exports - In-Memory
pub use rate_limit::InMemoryCounterStore;

#[cfg(feature = "postgres")]
pub use database::{DatabaseConfig, DatabaseConnections, PostgresCounterStore};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use rate_limit::{RedisConfig, RedisCounterStore};
