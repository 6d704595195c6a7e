//! Resolver error types.

use thiserror::Error;

/// Resolution errors.
///
/// Only `GatewayExhausted` and `InvalidGatewayUrl` surface from the public
/// resolve methods; the per-attempt variants exist so the fallback loop can
/// distinguish rate limiting and malformed payloads (skip to the next
/// gateway) from transient failures (retry the same gateway first).
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("all gateways exhausted for {id} ({gateways_tried} tried)")]
    GatewayExhausted { id: String, gateways_tried: usize },

    #[error("invalid gateway URL: {0}")]
    InvalidGatewayUrl(String),

    #[error("gateway rate limited the request")]
    RateLimited,

    #[error("gateway returned status {0}")]
    Status(u16),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Core(#[from] vitrine_core::Error),
}

impl ResolverError {
    /// Whether the same gateway is worth another attempt.
    ///
    /// Network errors and non-success statuses are transient; a 429 or a
    /// payload that failed to parse means the next gateway should be tried
    /// instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status(_))
    }
}

/// Result type for resolution operations.
pub type ResolverResult<T> = std::result::Result<T, ResolverError>;
