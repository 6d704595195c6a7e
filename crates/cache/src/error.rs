//! Cache store error types.

use thiserror::Error;

/// Cache store operation errors.
///
/// Any of these counts as a cache I/O failure to callers: the service layer
/// treats a failing read or write as a cache miss (fail open), so a storage
/// outage degrades to refetching rather than blocking page assembly.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
