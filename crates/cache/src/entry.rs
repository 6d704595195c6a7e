//! Cached per-collection state and merge rules.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use time::OffsetDateTime;
use vitrine_core::TokenMetadata;

/// Persistent cached state for one collection.
///
/// The trait-index sets serialize as ordered arrays (BTreeSet's natural JSON
/// form) and rehydrate as sets on read.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionCacheEntry {
    /// Last-write instant; readers treat entries older than the retention
    /// window as absent.
    #[serde(with = "time::serde::timestamp")]
    pub timestamp: OffsetDateTime,
    /// Resolved metadata keyed by token id.
    pub token_metadata: HashMap<u64, TokenMetadata>,
    /// Observed values per trait type.
    pub trait_index: HashMap<String, BTreeSet<String>>,
    /// Highest token id known to be fetched, contiguous from 1.
    /// Monotonically non-decreasing across the entry's lifetime.
    pub last_fetched_watermark: u64,
}

impl CollectionCacheEntry {
    /// Create a fresh, empty entry stamped now.
    pub fn new() -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            token_metadata: HashMap::new(),
            trait_index: HashMap::new(),
            last_fetched_watermark: 0,
        }
    }

    /// Age of the entry relative to now.
    pub fn age(&self) -> Duration {
        let elapsed = OffsetDateTime::now_utc() - self.timestamp;
        Duration::try_from(elapsed).unwrap_or(Duration::ZERO)
    }

    /// Whether the entry has outlived the retention window.
    pub fn is_expired(&self, retention: Duration) -> bool {
        self.age() > retention
    }

    /// Merge one chunk of fetch results into the entry.
    ///
    /// Per-id metadata is written when present; ids that failed to resolve
    /// (`None`) still advance the watermark, which moves to the maximum of
    /// its previous value and every id in the chunk so it cannot regress
    /// when chunks complete out of order. The timestamp is refreshed.
    pub fn merge_chunk(&mut self, results: &[(u64, Option<TokenMetadata>)]) {
        for (token_id, metadata) in results {
            if let Some(metadata) = metadata {
                for attr in &metadata.attributes {
                    self.trait_index
                        .entry(attr.trait_type.clone())
                        .or_default()
                        .insert(attr.value.clone());
                }
                self.token_metadata.insert(*token_id, metadata.clone());
            }
            self.last_fetched_watermark = self.last_fetched_watermark.max(*token_id);
        }
        self.timestamp = OffsetDateTime::now_utc();
    }
}

impl Default for CollectionCacheEntry {
    fn default() -> Self {
        Self::new()
    }
}
