//! PostgreSQL counter store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DbBackend, DbConn, DbErr, EntityTrait, Statement};

use tally_core::ports::CounterStore;
use tally_core::{CounterRecord, FixedWindow, StoreError};

use super::entity::rate_limit::Entity as RateLimitEntity;

/// Insert-or-reset-or-increment in one statement.
///
/// `$1` key, `$2` now, `$3` end of a window opened now. On conflict Postgres
/// holds the row lock of the existing record, so concurrent hits on one key
/// queue behind each other, and every `SET` expression reads the pre-update
/// row, so the count and expiry always change together.
pub(crate) const UPSERT_SQL: &str = r#"INSERT INTO rate_limits (key, count, expires_at)
VALUES ($1, 1, $3)
ON CONFLICT (key) DO UPDATE SET
    count = CASE WHEN rate_limits.expires_at <= $2 THEN 1 ELSE rate_limits.count + 1 END,
    expires_at = CASE WHEN rate_limits.expires_at <= $2 THEN EXCLUDED.expires_at ELSE rate_limits.expires_at END
RETURNING key, count, expires_at"#;

/// Counter store backed by the `rate_limits` table.
pub struct PostgresCounterStore {
    pub(crate) db: DbConn,
}

impl PostgresCounterStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

fn map_db_err(err: DbErr) -> StoreError {
    match err {
        DbErr::ConnectionAcquire(e) => StoreError::Connection(e.to_string()),
        DbErr::Conn(e) => StoreError::Connection(e.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

#[async_trait]
impl CounterStore for PostgresCounterStore {
    async fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: FixedWindow,
    ) -> Result<CounterRecord, StoreError> {
        let fresh_expiry = window
            .end_from(now)
            .map_err(|_| StoreError::InvalidWindow {
                seconds: window.seconds(),
            })?;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            UPSERT_SQL,
            [key.into(), now.into(), fresh_expiry.into()],
        );

        let row = RateLimitEntity::find()
            .from_raw_sql(stmt)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| StoreError::Query(format!("upsert for key {key} returned no row")))?;

        let record = CounterRecord::try_from(row)?;
        tracing::trace!(key = %key, count = record.count, "Counter row upserted");

        Ok(record)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
