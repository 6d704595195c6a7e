// Shared fixtures for pipeline integration tests.

use async_trait::async_trait;
use httpmock::Method::GET;
use httpmock::MockServer;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use vitrine_cache::{CollectionCache, SqliteStore};
use vitrine_core::{FetchConfig, GatewayConfig, OwnershipStatus, Tick};
use vitrine_pipeline::{
    AddressCollection, CollectionDetails, CollectionService, FetchSessionRegistry,
    PaginationOrchestrator, PipelineError, PipelineResult, PrefetchQueue,
};
use vitrine_resolver::GatewayResolver;

pub const CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

pub fn tick(s: &str) -> Tick {
    Tick::new(s).unwrap()
}

pub fn metadata_json(name: &str, trait_type: &str, value: &str) -> String {
    format!(
        r#"{{
            "name": "{name}",
            "description": "test token",
            "image": "ipfs://{CID}/image.png",
            "attributes": [{{"trait_type": "{trait_type}", "value": "{value}"}}]
        }}"#
    )
}

/// Serve identical metadata for every token path under the collection CID.
pub fn mock_gateway_catch_all(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path_contains(CID);
        then.status(200).body(metadata_json("Wisp", "Background", "Blue"));
    });
}

/// Upstream collection-service double with call counting and fault injection.
pub struct MockCollectionService {
    details: Option<CollectionDetails>,
    pub batch_calls: AtomicUsize,
    pub fail_batches: AtomicBool,
}

impl MockCollectionService {
    pub fn new(details: Option<CollectionDetails>) -> Arc<Self> {
        Arc::new(Self {
            details,
            batch_calls: AtomicUsize::new(0),
            fail_batches: AtomicBool::new(false),
        })
    }

    pub fn with_collection(total_supply: u64) -> Arc<Self> {
        Self::new(Some(CollectionDetails {
            buri: Some(format!("ipfs://{CID}")),
            max: total_supply,
            minted: total_supply,
        }))
    }
}

#[async_trait]
impl CollectionService for MockCollectionService {
    async fn get_collection_details(
        &self,
        _tick: &Tick,
    ) -> PipelineResult<Option<CollectionDetails>> {
        Ok(self.details.clone())
    }

    async fn get_tokens_batch(
        &self,
        _tick: &Tick,
        ids: &[u64],
    ) -> PipelineResult<HashMap<u64, OwnershipStatus>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batches.load(Ordering::SeqCst) {
            return Err(PipelineError::Upstream("injected batch failure".into()));
        }
        Ok(ids
            .iter()
            .map(|id| {
                (
                    *id,
                    OwnershipStatus {
                        owner: Some("kaspa:qtestowner".to_string()),
                        is_minted: true,
                    },
                )
            })
            .collect())
    }

    async fn get_address_collections(
        &self,
        _address: &str,
    ) -> PipelineResult<Vec<AddressCollection>> {
        Ok(Vec::new())
    }
}

pub fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        initial_batch: 6,
        background_batch: 8,
        chunk_size: 3,
        max_concurrent_chunks: 2,
        display_limit: 6,
        range_delay_ms: 10,
    }
}

pub fn gateway_config(server: &MockServer) -> GatewayConfig {
    GatewayConfig {
        endpoints: vec![format!("{}/ipfs/", server.base_url())],
        request_timeout_secs: 5,
        min_request_interval_ms: 0,
        retry_max_attempts: 1,
        retry_base_delay_ms: 1,
    }
}

pub struct Harness {
    pub cache: CollectionCache,
    pub service: Arc<MockCollectionService>,
    pub sessions: Arc<FetchSessionRegistry>,
    pub prefetch: Arc<PrefetchQueue>,
    pub orchestrator: PaginationOrchestrator,
    _temp: tempfile::TempDir,
}

pub async fn harness(
    server: &MockServer,
    service: Arc<MockCollectionService>,
    fetch: FetchConfig,
) -> Harness {
    let temp = tempfile::tempdir().unwrap();
    let store = Arc::new(
        SqliteStore::new(temp.path().join("cache.db"))
            .await
            .unwrap(),
    );
    let cache = CollectionCache::new(store, Duration::from_secs(3600));
    let resolver = Arc::new(GatewayResolver::new(&gateway_config(server)).unwrap());
    let sessions = Arc::new(FetchSessionRegistry::new());
    let prefetch = Arc::new(PrefetchQueue::new(
        resolver.clone(),
        cache.clone(),
        service.clone(),
        fetch.clone(),
    ));
    let orchestrator = PaginationOrchestrator::new(
        resolver,
        cache.clone(),
        service.clone(),
        sessions.clone(),
        prefetch.clone(),
        fetch,
    );

    Harness {
        cache,
        service,
        sessions,
        prefetch,
        orchestrator,
        _temp: temp,
    }
}

/// Poll `cond` until it holds or the deadline expires.
pub async fn wait_until<F, Fut>(what: &str, deadline: Duration, mut cond: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    loop {
        if cond().await {
            return;
        }
        if start.elapsed() > deadline {
            panic!("timed out waiting for: {what}");
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}
