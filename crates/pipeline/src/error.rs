//! Pipeline error types.

use thiserror::Error;
use vitrine_core::Tick;

/// Pipeline operation errors.
///
/// Only collection-level lookup failures are terminal for a page request.
/// Per-token resolution failures and per-chunk ownership failures are
/// absorbed where they occur and never surface through this type.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("collection not found: {0}")]
    CollectionNotFound(Tick),

    #[error("collection {0} has no metadata URI")]
    MissingMetadataUri(Tick),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("upstream HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("resolver error: {0}")]
    Resolver(#[from] vitrine_resolver::ResolverError),

    #[error(transparent)]
    Core(#[from] vitrine_core::Error),
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
