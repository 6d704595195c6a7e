//! Background prefetch of token metadata.

use crate::fetch;
use crate::session::FetchSession;
use crate::upstream::CollectionService;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use vitrine_cache::CollectionCache;
use vitrine_core::{ContentIdentifier, FetchConfig, Tick};
use vitrine_resolver::GatewayResolver;

#[derive(Default)]
struct QueueState {
    pending: VecDeque<u64>,
    running: bool,
}

/// Incrementally fetches metadata and ownership for token-id ranges and
/// merges the results into the collection cache.
///
/// Per collection there is one queue of pending ids and at most one
/// processing loop. The loop dequeues up to BACKGROUND_BATCH ids, splits them
/// into CHUNK_SIZE chunks and runs at most MAX_CONCURRENT_CHUNKS chunks in
/// flight; completion order is unspecified. Cancellation is checked once per
/// loop iteration, at chunk dispatch, and before scheduling the next range.
pub struct PrefetchQueue {
    resolver: Arc<GatewayResolver>,
    cache: CollectionCache,
    service: Arc<dyn CollectionService>,
    config: FetchConfig,
    queues: Mutex<HashMap<Tick, QueueState>>,
}

impl PrefetchQueue {
    /// Create a prefetch queue over the given collaborators.
    pub fn new(
        resolver: Arc<GatewayResolver>,
        cache: CollectionCache,
        service: Arc<dyn CollectionService>,
        config: FetchConfig,
    ) -> Self {
        Self {
            resolver,
            cache,
            service,
            config,
            queues: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Tick, QueueState>> {
        self.queues
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue one background range starting at `start` and kick off the
    /// processing loop if none is running for this collection.
    pub fn schedule_range(
        self: &Arc<Self>,
        session: &FetchSession,
        base_uri: &ContentIdentifier,
        total_supply: u64,
        start: u64,
    ) {
        if start == 0 || start > total_supply {
            return;
        }
        let end = total_supply.min(start + self.config.background_batch - 1);
        self.add(session, base_uri, total_supply, (start..=end).collect());
    }

    /// Append ids to the collection's queue, starting the loop if idle.
    pub fn add(
        self: &Arc<Self>,
        session: &FetchSession,
        base_uri: &ContentIdentifier,
        total_supply: u64,
        ids: Vec<u64>,
    ) {
        if ids.is_empty() {
            return;
        }
        let tick = session.tick().clone();
        let spawn_loop = {
            let mut queues = self.lock();
            let state = queues.entry(tick.clone()).or_default();
            state.pending.extend(ids);
            if state.running {
                false
            } else {
                state.running = true;
                true
            }
        };

        if spawn_loop {
            tracing::debug!(
                tick = %tick,
                session_id = %session.session_id(),
                "Starting prefetch loop"
            );
            let queue = Arc::clone(self);
            let session = session.clone();
            let base_uri = base_uri.clone();
            tokio::spawn(async move {
                queue.run_loop(session, base_uri, total_supply).await;
            });
        }
    }

    /// Number of ids still pending for a collection.
    pub fn pending_len(&self, tick: &Tick) -> usize {
        self.lock().get(tick).map_or(0, |s| s.pending.len())
    }

    async fn run_loop(
        self: Arc<Self>,
        session: FetchSession,
        base_uri: ContentIdentifier,
        total_supply: u64,
    ) {
        let tick = session.tick().clone();
        loop {
            // Cooperative cancellation check, once per iteration.
            if !session.is_active() {
                let mut queues = self.lock();
                if let Some(state) = queues.get_mut(&tick) {
                    state.pending.clear();
                    state.running = false;
                }
                tracing::debug!(
                    tick = %tick,
                    session_id = %session.session_id(),
                    "Prefetch loop stopped by cancellation"
                );
                return;
            }

            let batch: Vec<u64> = {
                let mut queues = self.lock();
                let state = queues.entry(tick.clone()).or_default();
                if state.pending.is_empty() {
                    state.running = false;
                    tracing::debug!(tick = %tick, "Prefetch queue drained");
                    return;
                }
                let n = state
                    .pending
                    .len()
                    .min(self.config.background_batch as usize);
                state.pending.drain(..n).collect()
            };

            let high = batch.iter().copied().max().unwrap_or(0);
            self.process_batch(&session, &base_uri, &batch).await;

            // Extend with the next range only while the session is live and
            // supply remains; the delay keeps gateways from saturating.
            let next_start = high + 1;
            if session.is_active() && next_start <= total_supply {
                tokio::time::sleep(self.config.range_delay()).await;
                let next_end = total_supply.min(high + self.config.background_batch);
                let mut queues = self.lock();
                let state = queues.entry(tick.clone()).or_default();
                state.pending.extend(next_start..=next_end);
            }
        }
    }

    async fn process_batch(
        &self,
        session: &FetchSession,
        base_uri: &ContentIdentifier,
        ids: &[u64],
    ) {
        let chunks: Vec<Vec<u64>> = ids
            .chunks(self.config.chunk_size as usize)
            .map(<[u64]>::to_vec)
            .collect();

        futures::stream::iter(chunks)
            .map(|chunk| self.process_chunk(session, base_uri, chunk))
            .buffer_unordered(self.config.max_concurrent_chunks)
            .collect::<Vec<()>>()
            .await;
    }

    async fn process_chunk(
        &self,
        session: &FetchSession,
        base_uri: &ContentIdentifier,
        chunk: Vec<u64>,
    ) {
        // Chunks queued behind the concurrency limit when cancellation fires
        // are not dispatched; chunks already resolving run to completion.
        if !session.is_active() {
            return;
        }

        let tick = session.tick();
        let results = fetch::resolve_chunk(&self.resolver, base_uri, &chunk).await;

        if let Err(err) = self.service.get_tokens_batch(tick, &chunk).await {
            tracing::warn!(
                tick = %tick,
                error = %err,
                "Ownership lookup failed for chunk, metadata still merged"
            );
        }

        // Read-modify-write merge without a transactional discipline: a
        // concurrent writer reading the same base entry can lose this
        // chunk's additions. The watermark max-reduction keeps the watermark
        // itself monotone under any completion order.
        let mut entry = self.cache.load(tick).await.unwrap_or_default();
        entry.merge_chunk(&results);
        self.cache.set(tick, &entry).await;

        tracing::debug!(
            tick = %tick,
            chunk_len = chunk.len(),
            watermark = entry.last_fetched_watermark,
            "Merged prefetch chunk"
        );
    }
}
