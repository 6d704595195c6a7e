//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use vitrine_pipeline::PipelineError;
use vitrine_resolver::ResolverError;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("resolver error: {0}")]
    Resolver(#[from] ResolverError),

    #[error("cache error: {0}")]
    Cache(#[from] vitrine_cache::CacheError),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
            Self::Pipeline(e) => match e {
                PipelineError::CollectionNotFound(_) => "collection_not_found",
                PipelineError::MissingMetadataUri(_) => "missing_metadata_uri",
                _ => "upstream_error",
            },
            Self::Resolver(e) => match e {
                ResolverError::GatewayExhausted { .. } => "gateway_exhausted",
                _ => "resolver_error",
            },
            Self::Cache(_) => "cache_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Pipeline(e) => match e {
                PipelineError::CollectionNotFound(_) => StatusCode::NOT_FOUND,
                PipelineError::Core(_) => StatusCode::BAD_REQUEST,
                // Terminal for the request, but retryable: the upstream
                // record or the gateways may recover.
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Resolver(e) => match e {
                ResolverError::InvalidGatewayUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
                ResolverError::Core(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
