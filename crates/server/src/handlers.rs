//! HTTP request handlers.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use vitrine_core::{ContentIdentifier, Tick};
use vitrine_pipeline::{AttributeFilter, Page};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" when the store is reachable.
    pub status: &'static str,
}

/// Health check (intentionally unauthenticated, for probes).
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.cache.health_check().await?;
    Ok(Json(HealthResponse { status: "ok" }))
}

/// Resolve a content identifier and stream the raw body back unconsumed,
/// with the winning gateway's content type.
pub async fn resolve_content(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Response> {
    let id = ContentIdentifier::parse(&path).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let raw = state.resolver.resolve_bytes(&id).await?;

    let content_type = raw
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Body::from_stream(raw.stream))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Companion no-op preflight response for cross-origin resolution calls.
pub async fn resolve_preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
        ],
    )
}

/// Query parameters for the page endpoint.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Zero-based token offset.
    #[serde(default)]
    pub offset: u64,
    /// Page size; 0 or absent uses the configured display limit.
    #[serde(default)]
    pub limit: u64,
    /// Attribute filter trait type (paired with `value`).
    pub trait_type: Option<String>,
    /// Attribute filter value (paired with `trait_type`).
    pub value: Option<String>,
}

/// Fetch one page of a collection's tokens.
pub async fn get_collection_tokens(
    State(state): State<AppState>,
    Path(tick): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page>> {
    let tick = Tick::new(&tick).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    // Browsing a collection with no tracked session is a new search: stop
    // whatever background work the previous search left running.
    if state.sessions.get(&tick).is_none() {
        state.sessions.cancel_all();
    }

    let filters = match (query.trait_type, query.value) {
        (Some(trait_type), Some(value)) => vec![AttributeFilter { trait_type, value }],
        (None, None) => Vec::new(),
        _ => {
            return Err(ApiError::BadRequest(
                "trait_type and value must be provided together".to_string(),
            ));
        }
    };

    let page = state
        .orchestrator
        .fetch_page(&tick, query.offset, query.limit, &filters)
        .await?;
    Ok(Json(page))
}

/// Drop one collection's cached entry.
pub async fn clear_collection_cache(
    State(state): State<AppState>,
    Path(tick): Path<String>,
) -> ApiResult<StatusCode> {
    let tick = Tick::new(&tick).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    state.sessions.cancel(&tick);
    state.cache.clear(Some(&tick)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Drop the entire cache store.
pub async fn clear_cache(State(state): State<AppState>) -> ApiResult<StatusCode> {
    state.sessions.cancel_all();
    state.cache.clear(None).await?;
    Ok(StatusCode::NO_CONTENT)
}
