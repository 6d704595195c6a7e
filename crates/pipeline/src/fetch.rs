//! Shared token-metadata resolution helpers.
//!
//! Used by both the synchronous gap-fill path and the background prefetch
//! loop. A failed resolution is recorded as `None` and never aborts the
//! caller's chunk.

use vitrine_core::{ContentIdentifier, TokenMetadata};
use vitrine_resolver::GatewayResolver;

/// Resolve one token's metadata under a collection base URI.
///
/// The per-token path is `<buri>/<id>.json`. On success the display URL is
/// derived from the primary gateway when the image reference is itself a
/// content identifier.
pub(crate) async fn resolve_token(
    resolver: &GatewayResolver,
    base_uri: &ContentIdentifier,
    token_id: u64,
) -> Option<TokenMetadata> {
    let id = match base_uri.join(&format!("{token_id}.json")) {
        Ok(id) => id,
        Err(err) => {
            tracing::debug!(token_id, error = %err, "Unresolvable token path");
            return None;
        }
    };

    match resolver.resolve_metadata(&id).await {
        Ok(mut metadata) => {
            if metadata.image_url.is_none() {
                if let Ok(image_id) = ContentIdentifier::parse(&metadata.image) {
                    metadata.image_url =
                        resolver.primary_url(&image_id).map(|u| u.to_string());
                }
            }
            Some(metadata)
        }
        Err(err) => {
            tracing::debug!(token_id, error = %err, "Token metadata unresolved, recording placeholder");
            None
        }
    }
}

/// Resolve every id in a chunk, sequentially within the chunk.
///
/// Concurrency lives at the chunk level; per-id failures become `None`.
pub(crate) async fn resolve_chunk(
    resolver: &GatewayResolver,
    base_uri: &ContentIdentifier,
    ids: &[u64],
) -> Vec<(u64, Option<TokenMetadata>)> {
    let mut results = Vec::with_capacity(ids.len());
    for &token_id in ids {
        let metadata = resolve_token(resolver, base_uri, token_id).await;
        results.push((token_id, metadata));
    }
    results
}
