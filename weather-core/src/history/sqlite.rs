//! SQLite implementation of [`HistoryStore`].
//!
//! Migrations under `weather-core/migrations` are embedded at compile time and
//! run by [`SqliteHistoryStore::connect`]. Queries use the runtime-checked
//! `sqlx::query` form so no `DATABASE_URL` is needed to build.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use super::HistoryStore;
use crate::model::HistoryRecord;

#[derive(Debug, Clone)]
pub struct SqliteHistoryStore {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: String,
    city_name: String,
    timestamp: DateTime<Utc>,
}

impl From<HistoryRow> for HistoryRecord {
    fn from(row: HistoryRow) -> Self {
        HistoryRecord {
            id: row.id,
            city_name: row.city_name,
            timestamp: row.timestamp,
        }
    }
}

impl SqliteHistoryStore {
    /// Open (or create) the database at `url` and run pending migrations.
    ///
    /// `url` is a sqlx SQLite URL such as `"sqlite://weather-history.db"`.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::migrated(pool).await
    }

    /// Private in-memory database, used by tests.
    ///
    /// Every in-memory connection is its own database, so the pool is pinned to
    /// a single connection that never expires.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn insert(&self, record: HistoryRecord) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO history (id, city_name, timestamp) VALUES (?1, ?2, ?3)")
            .bind(&record.id)
            .bind(&record.city_name)
            .bind(record.timestamp)
            .execute(&self.pool)
            .await?;
        debug!(id = %record.id, city = %record.city_name, "history record inserted");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<HistoryRecord>, sqlx::Error> {
        let rows: Vec<HistoryRow> =
            sqlx::query_as("SELECT id, city_name, timestamp FROM history ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(HistoryRecord::from).collect())
    }

    async fn delete_all(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM history").execute(&self.pool).await?;
        info!(deleted = result.rows_affected(), "history cleared");
        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
