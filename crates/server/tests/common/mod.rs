//! Common test utilities and fixtures.

use async_trait::async_trait;
use httpmock::Method::GET;
use httpmock::MockServer;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use vitrine_cache::{CollectionCache, SqliteStore};
use vitrine_core::{AppConfig, FetchConfig, GatewayConfig, OwnershipStatus, Tick};
use vitrine_pipeline::{
    AddressCollection, CollectionDetails, CollectionService, PipelineResult,
};
use vitrine_resolver::GatewayResolver;
use vitrine_server::{AppState, create_router};

pub const CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub gateway: MockServer,
    _temp_dir: tempfile::TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server backed by a mock gateway and a canned upstream.
    pub async fn new(total_supply: u64) -> Self {
        let gateway = MockServer::start();
        gateway.mock(|when, then| {
            when.method(GET).path_contains(CID);
            then.status(200)
                .header("content-type", "application/json")
                .body(metadata_json("Wisp", "Background", "Blue"));
        });

        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let store = Arc::new(
            SqliteStore::new(temp_dir.path().join("cache.db"))
                .await
                .expect("Failed to create cache store"),
        );
        let cache = CollectionCache::new(store, Duration::from_secs(3600));

        let mut config = AppConfig::default();
        config.gateway = GatewayConfig {
            endpoints: vec![format!("{}/ipfs/", gateway.base_url())],
            request_timeout_secs: 5,
            min_request_interval_ms: 0,
            retry_max_attempts: 1,
            retry_base_delay_ms: 1,
        };
        config.fetch = FetchConfig {
            initial_batch: 6,
            background_batch: 8,
            chunk_size: 3,
            max_concurrent_chunks: 2,
            display_limit: 6,
            range_delay_ms: 10,
        };

        let resolver = Arc::new(GatewayResolver::new(&config.gateway).unwrap());
        let service: Arc<dyn CollectionService> =
            Arc::new(CannedCollectionService { total_supply });

        let state = AppState::new(config, resolver, cache, service);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            gateway,
            _temp_dir: temp_dir,
        }
    }
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

/// Upstream double: knows the "wisp" collection, nothing else.
struct CannedCollectionService {
    total_supply: u64,
}

#[async_trait]
impl CollectionService for CannedCollectionService {
    async fn get_collection_details(
        &self,
        tick: &Tick,
    ) -> PipelineResult<Option<CollectionDetails>> {
        if tick.as_str() != "wisp" {
            return Ok(None);
        }
        Ok(Some(CollectionDetails {
            buri: Some(format!("ipfs://{CID}")),
            max: self.total_supply,
            minted: self.total_supply,
        }))
    }

    async fn get_tokens_batch(
        &self,
        _tick: &Tick,
        ids: &[u64],
    ) -> PipelineResult<HashMap<u64, OwnershipStatus>> {
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
