//! Upstream collection-service collaborator.
//!
//! The collection-metadata service is external to this system; only its
//! boundary is modeled here. Absence of a collection record or of its
//! metadata URI is terminal for that collection's page request.

use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use vitrine_core::{OwnershipStatus, Tick, UpstreamConfig};

/// Collection details as reported by the upstream service.
#[derive(Clone, Debug, Deserialize)]
pub struct CollectionDetails {
    /// Base metadata URI for the collection's tokens, if registered.
    #[serde(default)]
    pub buri: Option<String>,
    /// Total token supply.
    pub max: u64,
    /// Tokens minted so far.
    #[serde(default)]
    pub minted: u64,
}

/// One collection held by an address, with the tokens it owns.
#[derive(Clone, Debug, Deserialize)]
pub struct AddressCollection {
    /// Collection tick.
    pub tick: Tick,
    /// Owned tokens.
    #[serde(default)]
    pub tokens: Vec<AddressToken>,
}

/// A single owned token in an address listing.
#[derive(Clone, Debug, Deserialize)]
pub struct AddressToken {
    /// Token id within the collection.
    #[serde(alias = "tokenId")]
    pub token_id: u64,
    /// Owner address.
    pub owner: String,
}

/// Boundary trait for the upstream collection-metadata service.
#[async_trait]
pub trait CollectionService: Send + Sync + 'static {
    /// Fetch a collection's registration record. `None` means the service
    /// has no record for the tick.
    async fn get_collection_details(&self, tick: &Tick)
        -> PipelineResult<Option<CollectionDetails>>;

    /// Fetch live ownership/mint status for a batch of token ids.
    async fn get_tokens_batch(
        &self,
        tick: &Tick,
        ids: &[u64],
    ) -> PipelineResult<HashMap<u64, OwnershipStatus>>;

    /// List the collections an address holds tokens in.
    async fn get_address_collections(&self, address: &str)
        -> PipelineResult<Vec<AddressCollection>>;
}

#[derive(Debug, Deserialize)]
struct DetailsEnvelope {
    #[serde(default)]
    result: Option<CollectionDetails>,
}

#[derive(Debug, Deserialize)]
struct TokensBatchEnvelope {
    #[serde(default)]
    result: HashMap<u64, OwnershipStatus>,
}

#[derive(Debug, Deserialize)]
struct AddressCollectionsEnvelope {
    #[serde(default)]
    result: Vec<AddressCollection>,
}

#[derive(Debug, Serialize)]
struct TokensBatchRequest<'a> {
    ids: &'a [u64],
}

/// HTTP implementation of the collection-service boundary.
#[derive(Clone)]
pub struct HttpCollectionService {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpCollectionService {
    /// Create a client from upstream configuration.
    pub fn new(config: &UpstreamConfig) -> PipelineResult<Self> {
        Self::with_timeout(&config.base_url, config.request_timeout())
    }

    /// Create a client for a base URL with an explicit timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> PipelineResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| PipelineError::Upstream(format!("invalid base URL {base_url}: {e}")))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> PipelineResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| PipelineError::Upstream(format!("failed to build URL {path}: {e}")))
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> PipelineResult<T> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(PipelineError::Upstream(format!(
                "upstream returned {status}: {body}"
            )));
        }
        serde_json::from_str(&body)
            .map_err(|e| PipelineError::Upstream(format!("malformed upstream response: {e}")))
    }
}

#[async_trait]
impl CollectionService for HttpCollectionService {
    async fn get_collection_details(
        &self,
        tick: &Tick,
    ) -> PipelineResult<Option<CollectionDetails>> {
        let url = self.url(&format!("/v1/collections/{tick}"))?;
        let envelope: DetailsEnvelope = self.send_json(self.http.get(url)).await?;
        Ok(envelope.result)
    }

    async fn get_tokens_batch(
        &self,
        tick: &Tick,
        ids: &[u64],
    ) -> PipelineResult<HashMap<u64, OwnershipStatus>> {
        let url = self.url(&format!("/v1/collections/{tick}/tokens/batch"))?;
        let envelope: TokensBatchEnvelope = self
            .send_json(self.http.post(url).json(&TokensBatchRequest { ids }))
            .await?;
        Ok(envelope.result)
    }

    async fn get_address_collections(
        &self,
        address: &str,
    ) -> PipelineResult<Vec<AddressCollection>> {
        let url = self.url(&format!("/v1/addresses/{address}/collections"))?;
        let envelope: AddressCollectionsEnvelope = self.send_json(self.http.get(url)).await?;
        Ok(envelope.result)
    }
}
