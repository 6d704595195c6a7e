//! Persistent keyed store for collection cache entries.

use crate::entry::CollectionCacheEntry;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use vitrine_core::Tick;

/// Durable keyed store mapping collection tick → cache entry.
///
/// Addressed by exact key only; no range queries.
#[async_trait]
pub trait CollectionStore: Send + Sync + 'static {
    /// Read the stored entry for a tick, if any.
    async fn get(&self, tick: &Tick) -> CacheResult<Option<CollectionCacheEntry>>;

    /// Persist the entry for a tick, replacing any previous one.
    async fn put(&self, tick: &Tick, entry: &CollectionCacheEntry) -> CacheResult<()>;

    /// Remove one tick's entry.
    async fn delete(&self, tick: &Tick) -> CacheResult<()>;

    /// Remove every entry.
    async fn clear(&self) -> CacheResult<()>;

    /// Check store connectivity and health.
    async fn health_check(&self) -> CacheResult<()>;
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS collection_entries (
    tick TEXT PRIMARY KEY,
    updated_at INTEGER NOT NULL,
    entry_json TEXT NOT NULL
);
";

/// SQLite-based collection store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    pub async fn new(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // avoids persistent "database is locked" failures when background
            // merges race page-driven writes.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> CacheResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl CollectionStore for SqliteStore {
    async fn get(&self, tick: &Tick) -> CacheResult<Option<CollectionCacheEntry>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT entry_json FROM collection_entries WHERE tick = ?")
                .bind(tick.as_str())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((json,)) => {
                let entry = serde_json::from_str(&json).map_err(CacheError::Serialization)?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, tick: &Tick, entry: &CollectionCacheEntry) -> CacheResult<()> {
        let json = serde_json::to_string(entry)?;
        sqlx::query(
            "INSERT INTO collection_entries (tick, updated_at, entry_json) VALUES (?, ?, ?)
             ON CONFLICT(tick) DO UPDATE SET updated_at = excluded.updated_at,
                                             entry_json = excluded.entry_json",
        )
        .bind(tick.as_str())
        .bind(entry.timestamp.unix_timestamp())
        .bind(json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, tick: &Tick) -> CacheResult<()> {
        sqlx::query("DELETE FROM collection_entries WHERE tick = ?")
            .bind(tick.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        sqlx::query("DELETE FROM collection_entries")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tick(s: &str) -> Tick {
        Tick::new(s).unwrap()
    }

    async fn store() -> (tempfile::TempDir, SqliteStore) {
        let temp = tempdir().unwrap();
        let store = SqliteStore::new(temp.path().join("cache.db")).await.unwrap();
        (temp, store)
    }

    #[tokio::test]
    async fn put_get_round_trip() {
        let (_temp, store) = store().await;
        let mut entry = CollectionCacheEntry::new();
        entry.last_fetched_watermark = 24;

        store.put(&tick("wisp"), &entry).await.unwrap();
        let loaded = store.get(&tick("wisp")).await.unwrap().unwrap();
        assert_eq!(loaded.last_fetched_watermark, 24);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let (_temp, store) = store().await;
        assert!(store.get(&tick("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_existing_entry() {
        let (_temp, store) = store().await;
        let mut entry = CollectionCacheEntry::new();
        entry.last_fetched_watermark = 24;
        store.put(&tick("wisp"), &entry).await.unwrap();

        entry.last_fetched_watermark = 48;
        store.put(&tick("wisp"), &entry).await.unwrap();

        let loaded = store.get(&tick("wisp")).await.unwrap().unwrap();
        assert_eq!(loaded.last_fetched_watermark, 48);
    }

    #[tokio::test]
    async fn delete_and_clear() {
        let (_temp, store) = store().await;
        let entry = CollectionCacheEntry::new();
        store.put(&tick("a"), &entry).await.unwrap();
        store.put(&tick("b"), &entry).await.unwrap();

        store.delete(&tick("a")).await.unwrap();
        assert!(store.get(&tick("a")).await.unwrap().is_none());
        assert!(store.get(&tick("b")).await.unwrap().is_some());

        store.clear().await.unwrap();
        assert!(store.get(&tick("b")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn health_check_ok() {
        let (_temp, store) = store().await;
        store.health_check().await.unwrap();
    }
}
