//! SQLite connection handling.
//!
//! `SqliteStore` is the single storage handle of the application. It is built
//! once at startup and passed explicitly to whatever needs it; there is no
//! process-wide database singleton.

use core::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::instrument;

use crate::error::{StoreError, sqlx_err};

mod schema;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Takes the write lock up front. A deferred `BEGIN` that reads first and
/// writes later gets `SQLITE_BUSY` immediately when another writer got there
/// in between; `IMMEDIATE` makes writers queue on the busy timeout instead.
const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

/// Transactional SQLite store for clients, invoices and invoice items.
///
/// Cheap to clone: clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and bootstrap the schema.
    #[instrument(skip_all, fields(url = %url, max_connections = max_connections), err)]
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(sqlx_err("parse_database_url"))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(sqlx_err("connect"))?;

        Self::from_pool(pool).await
    }

    /// A private in-memory database (tests, demos).
    ///
    /// Every SQLite connection to `:memory:` gets its own database, so the pool
    /// is pinned to exactly one connection that is never recycled.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(sqlx_err("parse_database_url"))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(sqlx_err("connect"))?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and bootstrap the schema on it.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        schema::bootstrap(&pool).await?;
        Ok(Self { pool })
    }

    /// Start a transaction that holds the database write lock until it ends.
    pub(crate) async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        self.pool
            .begin_with(BEGIN_WRITE)
            .await
            .map_err(sqlx_err("begin_write_transaction"))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection; outstanding operations finish first.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let store = SqliteStore::in_memory().await.unwrap();
        SqliteStore::from_pool(store.pool().clone()).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(store.pool())
        .await
        .unwrap();

        assert_eq!(tables, vec!["clients", "invoice_items", "invoices"]);
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let store = SqliteStore::in_memory().await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
