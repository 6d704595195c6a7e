//! Persistent collection cache for Vitrine.
//!
//! This crate provides:
//! - The per-collection cache entry model and its chunk-merge rules
//! - A durable keyed store trait with a SQLite implementation
//! - The cache service applying the retention window, fail-open reads,
//!   and rarity enrichment on read

pub mod entry;
pub mod error;
pub mod store;

pub use entry::CollectionCacheEntry;
pub use error::{CacheError, CacheResult};
pub use store::{CollectionStore, SqliteStore};

use std::sync::Arc;
use std::time::Duration;
use vitrine_core::{CacheConfig, Tick, TraitRarityTable};

/// Cache service over a durable collection store.
///
/// Store failures never propagate from the read/write paths: a failing read
/// or write is treated as a cache miss (fail open) and logged, so a storage
/// outage degrades to refetching rather than blocking page assembly.
#[derive(Clone)]
pub struct CollectionCache {
    store: Arc<dyn CollectionStore>,
    retention: Duration,
}

impl CollectionCache {
    /// Create a cache service with the given store and retention window.
    pub fn new(store: Arc<dyn CollectionStore>, retention: Duration) -> Self {
        Self { store, retention }
    }

    /// Retention window applied to reads.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Read a collection's entry with its metadata snapshot enriched by the
    /// rarity engine. Expired entries are reported absent (they are not
    /// eagerly deleted).
    pub async fn get(&self, tick: &Tick) -> Option<CollectionCacheEntry> {
        let mut entry = self.load(tick).await?;
        vitrine_core::rarity::enrich(&mut entry.token_metadata);
        Some(entry)
    }

    /// Read a collection's entry and the trait-rarity table derived from it.
    pub async fn get_with_rarity(
        &self,
        tick: &Tick,
    ) -> Option<(CollectionCacheEntry, TraitRarityTable)> {
        let mut entry = self.load(tick).await?;
        let table = vitrine_core::rarity::enrich(&mut entry.token_metadata);
        Some((entry, table))
    }

    /// Read a collection's entry without rarity enrichment.
    ///
    /// This is the read used by merge paths, which write the entry back;
    /// derived fields must never be persisted.
    pub async fn load(&self, tick: &Tick) -> Option<CollectionCacheEntry> {
        let entry = match self.store.get(tick).await {
            Ok(entry) => entry?,
            Err(err) => {
                tracing::warn!(tick = %tick, error = %err, "Cache read failed, treating as miss");
                return None;
            }
        };

        if entry.is_expired(self.retention) {
            tracing::debug!(tick = %tick, "Cache entry expired, treating as absent");
            return None;
        }
        Some(entry)
    }

    /// Persist a collection's entry. Write failures are logged and absorbed.
    pub async fn set(&self, tick: &Tick, entry: &CollectionCacheEntry) {
        if let Err(err) = self.store.put(tick, entry).await {
            tracing::warn!(tick = %tick, error = %err, "Cache write failed, continuing uncached");
        }
    }

    /// Remove one collection's entry, or every entry when `tick` is None.
    pub async fn clear(&self, tick: Option<&Tick>) -> CacheResult<()> {
        match tick {
            Some(tick) => self.store.delete(tick).await,
            None => self.store.clear().await,
        }
    }

    /// Check the underlying store's health.
    pub async fn health_check(&self) -> CacheResult<()> {
        self.store.health_check().await
    }
}

/// Create a collection cache from configuration.
pub async fn from_config(config: &CacheConfig) -> CacheResult<CollectionCache> {
    config.validate().map_err(CacheError::Config)?;
    let store = SqliteStore::new(&config.path).await?;
    Ok(CollectionCache::new(Arc::new(store), config.retention()))
}
