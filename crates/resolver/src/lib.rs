//! Content resolution through unreliable public gateways.
//!
//! This crate provides:
//! - A request pacer spacing outbound calls process-wide
//! - A bounded exponential-backoff retry policy
//! - A gateway resolver walking an ordered fallback chain

pub mod error;
pub mod gateway;
pub mod pacer;
pub mod retry;

pub use error::{ResolverError, ResolverResult};
pub use gateway::{ByteStream, GatewayResolver, RawContent};
pub use pacer::RequestPacer;
pub use retry::RetryPolicy;

use std::sync::Arc;
use vitrine_core::GatewayConfig;

/// Create a gateway resolver from configuration.
pub fn from_config(config: &GatewayConfig) -> ResolverResult<Arc<GatewayResolver>> {
    Ok(Arc::new(GatewayResolver::new(config)?))
}
