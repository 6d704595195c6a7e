//! Gateway fallback resolution.

use crate::error::{ResolverError, ResolverResult};
use crate::pacer::RequestPacer;
use crate::retry::RetryPolicy;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use url::Url;
use vitrine_core::{ContentIdentifier, GatewayConfig, TokenMetadata};

/// A boxed stream of raw body bytes from the winning gateway.
pub type ByteStream = Pin<Box<dyn Stream<Item = ResolverResult<Bytes>> + Send>>;

/// Raw content streamed back unconsumed from whichever gateway succeeded.
pub struct RawContent {
    /// Content type as reported by the gateway, if any.
    pub content_type: Option<String>,
    /// The body stream.
    pub stream: ByteStream,
}

/// Resolves content identifiers through an ordered list of gateways.
///
/// Each resolution walks the list from the head; earlier entries are
/// preferred whenever they succeed, regardless of conceptual quality. No
/// gateway health or ranking state is retained between calls. Per gateway,
/// transient failures are retried with backoff; a 429 or a malformed payload
/// falls through to the next gateway immediately.
pub struct GatewayResolver {
    gateways: Vec<Url>,
    client: reqwest::Client,
    pacer: RequestPacer,
    retry: RetryPolicy,
}

impl GatewayResolver {
    /// Build a resolver from gateway configuration.
    pub fn new(config: &GatewayConfig) -> ResolverResult<Self> {
        config
            .validate()
            .map_err(ResolverError::InvalidGatewayUrl)?;

        let gateways = config
            .endpoints
            .iter()
            .map(|endpoint| {
                // Url::join treats a base without a trailing slash as a file
                // and would drop its last segment.
                let normalized = if endpoint.ends_with('/') {
                    endpoint.clone()
                } else {
                    format!("{endpoint}/")
                };
                Url::parse(&normalized)
                    .map_err(|e| ResolverError::InvalidGatewayUrl(format!("{endpoint}: {e}")))
            })
            .collect::<ResolverResult<Vec<_>>>()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            gateways,
            client,
            pacer: RequestPacer::new(config.min_request_interval()),
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Number of configured gateways.
    pub fn gateway_count(&self) -> usize {
        self.gateways.len()
    }

    /// Display URL for an identifier via the preferred (head) gateway.
    ///
    /// No request is made; this is only the URL a client would fetch.
    pub fn primary_url(&self, id: &ContentIdentifier) -> Option<Url> {
        self.gateways
            .first()
            .and_then(|gateway| gateway.join(&id.gateway_path()).ok())
    }

    /// Resolve an identifier to structured data, validated against `T`.
    pub async fn resolve_json<T: DeserializeOwned>(
        &self,
        id: &ContentIdentifier,
    ) -> ResolverResult<T> {
        self.try_in_order(id, |url| fetch_json::<T>(&self.client, url))
            .await
    }

    /// Resolve an identifier to token metadata, validated against the strict
    /// schema at this boundary.
    pub async fn resolve_metadata(&self, id: &ContentIdentifier) -> ResolverResult<TokenMetadata> {
        self.resolve_json(id).await
    }

    /// Resolve an identifier to its raw byte stream, unconsumed.
    pub async fn resolve_bytes(&self, id: &ContentIdentifier) -> ResolverResult<RawContent> {
        self.try_in_order(id, |url| fetch_bytes(&self.client, url))
            .await
    }

    /// Walk the gateway list in order, returning the first success.
    ///
    /// The list order is the entire tie-break policy. Every call restarts at
    /// the head of the list.
    async fn try_in_order<T, F, Fut>(&self, id: &ContentIdentifier, fetch: F) -> ResolverResult<T>
    where
        F: Fn(Url) -> Fut,
        Fut: Future<Output = ResolverResult<T>>,
    {
        let path = id.gateway_path();
        for gateway in &self.gateways {
            let url = match gateway.join(&path) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(gateway = %gateway, id = %id, error = %e, "Skipping unjoinable gateway URL");
                    continue;
                }
            };

            self.pacer.pace().await;

            match self
                .retry
                .run_if(|| fetch(url.clone()), ResolverError::is_retryable)
                .await
            {
                Ok(value) => {
                    tracing::debug!(gateway = %gateway, id = %id, "Resolved content");
                    return Ok(value);
                }
                Err(err) => {
                    tracing::debug!(
                        gateway = %gateway,
                        id = %id,
                        error = %err,
                        "Gateway failed, falling through"
                    );
                }
            }
        }

        Err(ResolverError::GatewayExhausted {
            id: id.to_string(),
            gateways_tried: self.gateways.len(),
        })
    }
}

async fn fetch_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: Url,
) -> ResolverResult<T> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ResolverError::RateLimited);
    }
    if !status.is_success() {
        return Err(ResolverError::Status(status.as_u16()));
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ResolverError::MalformedPayload(e.to_string()))
}

async fn fetch_bytes(client: &reqwest::Client, url: Url) -> ResolverResult<RawContent> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ResolverError::RateLimited);
    }
    if !status.is_success() {
        return Err(ResolverError::Status(status.as_u16()));
    }
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let stream = response.bytes_stream().map_err(ResolverError::Http);
    Ok(RawContent {
        content_type,
        stream: Box::pin(stream),
    })
}
