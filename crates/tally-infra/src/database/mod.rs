//! PostgreSQL-backed counter table.

mod connections;
pub mod entity;
mod postgres_store;

pub use connections::{DatabaseConfig, DatabaseConnections};
pub use postgres_store::PostgresCounterStore;

#[cfg(test)]
mod tests;
