use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, MockDatabase, Transaction};

use tally_core::ports::CounterStore;
use tally_core::{FixedWindow, StoreError};

use super::entity::rate_limit;
use super::postgres_store::{PostgresCounterStore, UPSERT_SQL};
use super::{DatabaseConfig, DatabaseConnections};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn row(key: &str, count: i64, expires_at: DateTime<Utc>) -> rate_limit::Model {
    rate_limit::Model {
        key: key.to_owned(),
        count,
        expires_at: expires_at.into(),
    }
}

#[tokio::test]
async fn test_hit_issues_single_upsert() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![row("ip:1.2.3.4", 1, at(60))]])
        .into_connection();
    let store = PostgresCounterStore::new(db);

    let record = store
        .hit("ip:1.2.3.4", at(0), FixedWindow::from_secs(60))
        .await
        .unwrap();

    assert_eq!(record.key, "ip:1.2.3.4");
    assert_eq!(record.count, 1);
    assert_eq!(record.expires_at, at(60));

    // Exactly one statement, carrying now and the fresh window end.
    assert_eq!(
        store.db.into_transaction_log(),
        [Transaction::from_sql_and_values(
            DatabaseBackend::Postgres,
            UPSERT_SQL,
            ["ip:1.2.3.4".into(), at(0).into(), at(60).into()],
        )]
    );
}

#[tokio::test]
async fn test_hit_returns_row_written_by_store() {
    // An active window: the store kept the old expiry and bumped the count.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![row("login:alice", 7, at(30))]])
        .into_connection();
    let store = PostgresCounterStore::new(db);

    let record = store
        .hit("login:alice", at(10), FixedWindow::from_secs(60))
        .await
        .unwrap();

    assert_eq!(record.count, 7);
    assert_eq!(record.expires_at, at(30));
}

#[tokio::test]
async fn test_negative_count_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![row("k", -1, at(60))]])
        .into_connection();
    let store = PostgresCounterStore::new(db);

    let err = store
        .hit("k", at(0), FixedWindow::from_secs(60))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

#[tokio::test]
async fn test_missing_returning_row_is_an_error() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<rate_limit::Model>::new()])
        .into_connection();
    let store = PostgresCounterStore::new(db);

    let err = store
        .hit("k", at(0), FixedWindow::from_secs(60))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Query(_)));
}

#[tokio::test]
async fn test_query_failure_surfaces_as_store_error() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom("deadlock detected".to_owned())])
        .into_connection();
    let store = PostgresCounterStore::new(db);

    let err = store
        .hit("k", at(0), FixedWindow::from_secs(60))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Query(ref msg) if msg.contains("deadlock detected")));
}

#[tokio::test]
async fn test_unstorable_window_sends_no_statement() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let store = PostgresCounterStore::new(db);

    let err = store
        .hit("k", at(0), FixedWindow::from_secs(u64::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidWindow { seconds: u64::MAX }));
    assert!(store.db.into_transaction_log().is_empty());
}

/// Runs against a real server when `TEST_DATABASE_URL` is set.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_live_concurrent_hits_are_serialized() {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        return;
    };
    let Ok(connections) = DatabaseConnections::init(&DatabaseConfig::new(url)).await else {
        return;
    };

    connections
        .main
        .execute_unprepared(
            "CREATE TABLE IF NOT EXISTS rate_limits (
                key TEXT PRIMARY KEY,
                count BIGINT NOT NULL DEFAULT 0,
                expires_at TIMESTAMPTZ NOT NULL
            )",
        )
        .await
        .unwrap();

    let store = Arc::new(PostgresCounterStore::new(connections.main));
    let key = format!("test:concurrent:{}", Utc::now().timestamp_nanos_opt().unwrap_or(0));
    let now = Utc::now();

    let handles: Vec<_> = (0..40)
        .map(|_| {
            let store = store.clone();
            let key = key.clone();
            tokio::spawn(async move {
                store
                    .hit(&key, now, FixedWindow::from_secs(60))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut counts = Vec::new();
    let mut expiries = Vec::new();
    for handle in handles {
        let record = handle.await.unwrap();
        counts.push(record.count);
        expiries.push(record.expires_at);
    }
    counts.sort_unstable();

    assert_eq!(counts, (1..=40).collect::<Vec<u64>>());
    assert!(expiries.windows(2).all(|w| w[0] == w[1]));

    // A hit after the window lapsed resets in place.
    let later = now + chrono::TimeDelta::seconds(61);
    let record = store
        .hit(&key, later, FixedWindow::from_secs(60))
        .await
        .unwrap();
    assert_eq!(record.count, 1);
    assert!(record.expires_at > expiries[0]);
}
