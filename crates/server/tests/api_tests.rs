//! Integration tests for HTTP API endpoints.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{CID, TestServer};
use serde_json::Value;
use tower::ServiceExt;

async fn send(
    router: &axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, headers, json)
}

#[tokio::test]
async fn health_check_reports_ok() {
    let server = TestServer::new(10).await;
    let (status, _, body) = send(&server.router, "GET", "/v1/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn page_endpoint_returns_populated_tokens() {
    let server = TestServer::new(10).await;
    let (status, _, body) =
        send(&server.router, "GET", "/v1/collections/wisp/tokens?offset=0&limit=6").await;

    assert_eq!(status, StatusCode::OK);
    let tokens = body["tokens"].as_array().unwrap();
    assert_eq!(tokens.len(), 6);
    assert_eq!(tokens[0]["token_id"], 1);
    assert_eq!(tokens[0]["metadata"]["name"], "Wisp");
    assert_eq!(tokens[0]["ownership"]["is_minted"], true);
    assert_eq!(body["has_more"], true);
    assert_eq!(body["next_offset"], 6);
}

#[tokio::test]
async fn page_endpoint_rejects_half_a_filter() {
    let server = TestServer::new(10).await;
    let (status, _, body) = send(
        &server.router,
        "GET",
        "/v1/collections/wisp/tokens?trait_type=Background",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn unknown_collection_maps_to_not_found() {
    let server = TestServer::new(10).await;
    let (status, _, body) =
        send(&server.router, "GET", "/v1/collections/ghost/tokens").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "collection_not_found");
}

#[tokio::test]
async fn resolve_endpoint_streams_gateway_content() {
    let server = TestServer::new(10).await;
    let (status, headers, body) =
        send(&server.router, "GET", &format!("/ipfs/{CID}/1.json")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(body["name"], "Wisp");
}

#[tokio::test]
async fn resolve_preflight_is_a_no_op() {
    let server = TestServer::new(10).await;
    let (status, headers, body) =
        send(&server.router, "OPTIONS", &format!("/ipfs/{CID}/1.json")).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert!(
        headers
            .get("access-control-allow-methods")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("GET")
    );
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn resolve_endpoint_rejects_malformed_identifiers() {
    let server = TestServer::new(10).await;
    let (status, _, body) = send(&server.router, "GET", "/ipfs/not-a-cid").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn clearing_a_collection_cache_forces_a_refetch() {
    let server = TestServer::new(4).await;

    let (status, _, _) =
        send(&server.router, "GET", "/v1/collections/wisp/tokens").await;
    assert_eq!(status, StatusCode::OK);

    let tick = vitrine_core::Tick::new("wisp").unwrap();
    assert!(server.state.cache.get(&tick).await.is_some());

    let (status, _, _) =
        send(&server.router, "DELETE", "/v1/collections/wisp/cache").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(server.state.cache.get(&tick).await.is_none());
}

#[tokio::test]
async fn clearing_everything_cancels_sessions() {
    let server = TestServer::new(10).await;

    // A page request on a not-yet-complete collection leaves a background
    // session behind.
    let (status, _, _) =
        send(&server.router, "GET", "/v1/collections/wisp/tokens").await;
    assert_eq!(status, StatusCode::OK);
    let tick = vitrine_core::Tick::new("wisp").unwrap();
    let session = server.state.sessions.get(&tick).expect("session");

    // Let the background fetch drain so no in-flight merge races the clear.
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        let done = server
            .state
            .cache
            .load(&tick)
            .await
            .is_some_and(|e| e.last_fetched_watermark >= 10);
        if done {
            break;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("background fetch did not finish in time");
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }

    let (status, _, _) = send(&server.router, "DELETE", "/v1/cache").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!session.is_active());
    assert!(server.state.cache.get(&tick).await.is_none());
}
