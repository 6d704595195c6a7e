// HTTP collection-service client against a mock upstream.

use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use std::time::Duration;
use vitrine_core::Tick;
use vitrine_pipeline::{CollectionService, HttpCollectionService, PipelineError};

fn client(server: &MockServer) -> HttpCollectionService {
    HttpCollectionService::with_timeout(&server.base_url(), Duration::from_secs(2)).unwrap()
}

fn tick(s: &str) -> Tick {
    Tick::new(s).unwrap()
}

#[tokio::test]
async fn collection_details_round_trip() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/collections/wisp");
        then.status(200).json_body(serde_json::json!({
            "result": {"buri": "ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG", "max": 100, "minted": 40}
        }));
    });

    let details = client(&server)
        .get_collection_details(&tick("wisp"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(details.max, 100);
    assert_eq!(details.minted, 40);
    assert!(details.buri.unwrap().starts_with("ipfs://"));
}

#[tokio::test]
async fn absent_result_means_no_record() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/collections/ghost");
        then.status(200).json_body(serde_json::json!({}));
    });

    let details = client(&server)
        .get_collection_details(&tick("ghost"))
        .await
        .unwrap();
    assert!(details.is_none());
}

#[tokio::test]
async fn tokens_batch_parses_camel_case_mint_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1/collections/wisp/tokens/batch")
            .json_body(serde_json::json!({"ids": [1, 2]}));
        then.status(200).json_body(serde_json::json!({
            "result": {
                "1": {"owner": "kaspa:qqowner", "isMinted": true},
                "2": {"isMinted": false}
            }
        }));
    });

    let statuses = client(&server)
        .get_tokens_batch(&tick("wisp"), &[1, 2])
        .await
        .unwrap();

    assert_eq!(statuses.len(), 2);
    assert!(statuses[&1].is_minted);
    assert_eq!(statuses[&1].owner.as_deref(), Some("kaspa:qqowner"));
    assert!(!statuses[&2].is_minted);
    assert!(statuses[&2].owner.is_none());
}

#[tokio::test]
async fn address_collections_round_trip() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/addresses/kaspa:qqholder/collections");
        then.status(200).json_body(serde_json::json!({
            "result": [
                {"tick": "wisp", "tokens": [{"tokenId": 3, "owner": "kaspa:qqholder"}]}
            ]
        }));
    });

    let collections = client(&server)
        .get_address_collections("kaspa:qqholder")
        .await
        .unwrap();

    assert_eq!(collections.len(), 1);
    assert_eq!(collections[0].tick.as_str(), "wisp");
    assert_eq!(collections[0].tokens[0].token_id, 3);
}

#[tokio::test]
async fn upstream_failure_surfaces_as_upstream_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/collections/wisp");
        then.status(500).body("boom");
    });

    let err = client(&server)
        .get_collection_details(&tick("wisp"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Upstream(_)));
}
