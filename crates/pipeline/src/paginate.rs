//! Page assembly over the collection cache.

use crate::error::{PipelineError, PipelineResult};
use crate::fetch;
use crate::prefetch::PrefetchQueue;
use crate::session::FetchSessionRegistry;
use crate::upstream::CollectionService;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use vitrine_cache::{CollectionCache, CollectionCacheEntry};
use vitrine_core::{ContentIdentifier, FetchConfig, OwnershipStatus, Tick, TokenMetadata};
use vitrine_resolver::GatewayResolver;

/// An exact (trait type, value) filter applied against cached metadata.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AttributeFilter {
    /// Trait category to match.
    pub trait_type: String,
    /// Required value.
    pub value: String,
}

/// One token slot in an assembled page.
///
/// Metadata is `None` for tokens whose resolution failed; such tokens still
/// render with placeholder text rather than being omitted from unfiltered
/// pages.
#[derive(Clone, Debug, Serialize)]
pub struct PageToken {
    /// Token id.
    pub token_id: u64,
    /// Cached metadata, enriched with rarity, when resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TokenMetadata>,
    /// Live ownership status, when the batched lookup succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownership: Option<OwnershipStatus>,
}

/// An assembled page.
#[derive(Clone, Debug, Serialize)]
pub struct Page {
    /// Tokens in the requested window, post-filtering.
    pub tokens: Vec<PageToken>,
    /// Collection total supply.
    pub total_supply: u64,
    /// Whether another page follows.
    pub has_more: bool,
    /// Offset of the next page when `has_more`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u64>,
}

/// Top-level page entry point.
///
/// Guarantees the requested token range is populated (synchronously filling
/// gaps), triggers background prefetch for the remainder, and returns the
/// assembled page with rarity-enriched metadata.
pub struct PaginationOrchestrator {
    resolver: Arc<GatewayResolver>,
    cache: CollectionCache,
    service: Arc<dyn CollectionService>,
    sessions: Arc<FetchSessionRegistry>,
    prefetch: Arc<PrefetchQueue>,
    config: FetchConfig,
}

impl PaginationOrchestrator {
    /// Create an orchestrator over the given collaborators.
    pub fn new(
        resolver: Arc<GatewayResolver>,
        cache: CollectionCache,
        service: Arc<dyn CollectionService>,
        sessions: Arc<FetchSessionRegistry>,
        prefetch: Arc<PrefetchQueue>,
        config: FetchConfig,
    ) -> Self {
        Self {
            resolver,
            cache,
            service,
            sessions,
            prefetch,
            config,
        }
    }

    /// The session registry, for consumer-driven cancellation.
    pub fn sessions(&self) -> &Arc<FetchSessionRegistry> {
        &self.sessions
    }

    /// Fetch one page of a collection.
    ///
    /// `limit` of 0 uses the configured display limit. Only collection-level
    /// lookup failures (missing record, missing metadata URI) are terminal;
    /// per-token and ownership failures degrade to placeholder slots.
    pub async fn fetch_page(
        &self,
        tick: &Tick,
        offset: u64,
        limit: u64,
        filters: &[AttributeFilter],
    ) -> PipelineResult<Page> {
        let limit = if limit == 0 {
            self.config.display_limit
        } else {
            limit
        };

        let details = self
            .service
            .get_collection_details(tick)
            .await?
            .ok_or_else(|| PipelineError::CollectionNotFound(tick.clone()))?;
        let buri = details
            .buri
            .ok_or_else(|| PipelineError::MissingMetadataUri(tick.clone()))?;
        let base_uri = ContentIdentifier::parse(&buri)?;
        let total_supply = details.max;

        // Cold cache: synchronously fill the initial batch and hand the
        // remainder to a background session.
        let mut entry = match self.cache.load(tick).await {
            Some(entry) => entry,
            None => self.initialize_collection(tick, &base_uri, total_supply).await,
        };
        let watermark_before = entry.last_fetched_watermark;

        // Requested id window, clamped to supply.
        let start = offset + 1;
        let end = (offset + limit).min(total_supply);
        if start > end {
            return Ok(Page {
                tokens: Vec::new(),
                total_supply,
                has_more: false,
                next_offset: None,
            });
        }

        // The requested page must be fully populated on return, even when
        // background prefetch has not reached it yet.
        if end > self.config.initial_batch && end > entry.last_fetched_watermark {
            let fill_start = (entry.last_fetched_watermark + 1).max(start);
            let ids: Vec<u64> = (fill_start..=end).collect();
            tracing::debug!(
                tick = %tick,
                fill_start,
                fill_end = end,
                "Synchronously filling page gap"
            );
            let results = self.fetch_ids(tick, &base_uri, &ids).await;

            // Reload before merging to pick up background chunk completions;
            // the read-modify-write remains racy, as documented.
            let mut latest = self.cache.load(tick).await.unwrap_or_default();
            latest.merge_chunk(&results);
            self.cache.set(tick, &latest).await;
            entry = latest;
        }

        // Live ownership for exactly this page's ids, never served from the
        // metadata cache.
        let page_ids: Vec<u64> = (start..=end).collect();
        let ownership = match self.service.get_tokens_batch(tick, &page_ids).await {
            Ok(statuses) => statuses,
            Err(err) => {
                tracing::warn!(tick = %tick, error = %err, "Page ownership lookup failed");
                HashMap::new()
            }
        };

        // Rarity enrichment over the snapshot as cached so far.
        vitrine_core::rarity::enrich(&mut entry.token_metadata);

        let mut tokens: Vec<PageToken> = page_ids
            .iter()
            .map(|id| PageToken {
                token_id: *id,
                metadata: entry.token_metadata.get(id).cloned(),
                ownership: ownership.get(id).cloned(),
            })
            .collect();

        // Attribute filters match against cached metadata only; tokens with
        // nothing cached yet are excluded from filtered results.
        if !filters.is_empty() {
            tokens.retain(|token| {
                token.metadata.as_ref().is_some_and(|meta| {
                    filters
                        .iter()
                        .all(|f| meta.has_attribute(&f.trait_type, &f.value))
                })
            });
        }

        // (Re)start background prefetch when the window outran the watermark.
        if end > watermark_before {
            let resume_from = (entry.last_fetched_watermark + 1).max(self.config.initial_batch + 1);
            if resume_from <= total_supply {
                let session = self.sessions.start(tick);
                self.prefetch
                    .schedule_range(&session, &base_uri, total_supply, resume_from);
            }
        }

        let has_more = offset + limit < total_supply;
        Ok(Page {
            tokens,
            total_supply,
            has_more,
            next_offset: has_more.then_some(offset + limit),
        })
    }

    /// First page request for an uncached (or expired) collection: fetch the
    /// initial batch synchronously and start prefetch for the remainder.
    async fn initialize_collection(
        &self,
        tick: &Tick,
        base_uri: &ContentIdentifier,
        total_supply: u64,
    ) -> CollectionCacheEntry {
        let count = self.config.initial_batch.min(total_supply);
        tracing::info!(tick = %tick, count, total_supply, "Initializing collection cache");

        let ids: Vec<u64> = (1..=count).collect();
        let results = self.fetch_ids(tick, base_uri, &ids).await;

        let mut entry = CollectionCacheEntry::new();
        entry.merge_chunk(&results);
        self.cache.set(tick, &entry).await;

        if total_supply > count {
            let session = self.sessions.start(tick);
            self.prefetch
                .schedule_range(&session, base_uri, total_supply, count + 1);
        }
        entry
    }

    /// Synchronously fetch metadata and ownership for a set of ids, in
    /// bounded-concurrency chunks. Per-id failures become `None`.
    async fn fetch_ids(
        &self,
        tick: &Tick,
        base_uri: &ContentIdentifier,
        ids: &[u64],
    ) -> Vec<(u64, Option<TokenMetadata>)> {
        let chunks: Vec<Vec<u64>> = ids
            .chunks(self.config.chunk_size as usize)
            .map(<[u64]>::to_vec)
            .collect();

        let mut results: Vec<(u64, Option<TokenMetadata>)> = futures::stream::iter(chunks)
            .map(|chunk| async move {
                fetch::resolve_chunk(&self.resolver, base_uri, &chunk).await
            })
            .buffer_unordered(self.config.max_concurrent_chunks)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect();
        results.sort_by_key(|(id, _)| *id);

        if let Err(err) = self.service.get_tokens_batch(tick, ids).await {
            tracing::warn!(tick = %tick, error = %err, "Ownership lookup failed during fill");
        }

        results
    }
}
