//! Persistence of search events.
//!
//! [`HistoryStore`] is the seam between the service and the database. The
//! default implementation is [`sqlite::SqliteHistoryStore`].

use async_trait::async_trait;
use std::fmt::Debug;

use crate::model::HistoryRecord;

pub mod sqlite;

pub use sqlite::SqliteHistoryStore;

#[async_trait]
pub trait HistoryStore: Send + Sync + Debug {
    /// Persist a record exactly as given.
    async fn insert(&self, record: HistoryRecord) -> Result<(), sqlx::Error>;

    /// Every record, in insertion order.
    async fn list_all(&self) -> Result<Vec<HistoryRecord>, sqlx::Error>;

    /// Remove every record. Returns how many were removed.
    async fn delete_all(&self) -> Result<u64, sqlx::Error>;

    /// Release the underlying connection(s).
    async fn close(&self) {}

    /// Record a search for `city_name` stamped with the current time.
    async fn append(&self, city_name: &str) -> Result<HistoryRecord, sqlx::Error> {
        let record = HistoryRecord::new(city_name);
        self.insert(record.clone()).await?;
        Ok(record)
    }
}
