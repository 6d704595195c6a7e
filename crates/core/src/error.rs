//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid content identifier: {0}")]
    InvalidContentId(String),

    #[error("invalid collection tick: {0}")]
    InvalidTick(String),

    #[error("metadata schema violation: {0}")]
    MetadataSchema(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
