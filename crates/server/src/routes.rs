//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::{delete, get};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (intentionally unauthenticated for probes)
        .route("/v1/health", get(handlers::health_check))
        // Collection browsing
        .route(
            "/v1/collections/{tick}/tokens",
            get(handlers::get_collection_tokens),
        )
        // Explicit cache management
        .route(
            "/v1/collections/{tick}/cache",
            delete(handlers::clear_collection_cache),
        )
        .route("/v1/cache", delete(handlers::clear_cache))
        // Content resolution boundary, with its no-op CORS preflight
        .route(
            "/ipfs/{*path}",
            get(handlers::resolve_content).options(handlers::resolve_preflight),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
