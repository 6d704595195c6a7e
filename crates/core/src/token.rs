//! Token metadata model.
//!
//! The metadata schema is strict at the resolution boundary: `name`,
//! `description` and `image` are required, everything else is explicitly
//! optional. The derived rarity fields are populated only by the rarity
//! engine on cache reads and are never persisted.

use serde::{Deserialize, Deserializer, Serialize};

/// A single (trait type, value) attribute pair.
///
/// Upstream metadata is inconsistent about value types (strings, numbers,
/// booleans all appear in the wild); values are normalized to their string
/// rendering on deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAttribute {
    /// Trait category, e.g. "Background".
    #[serde(alias = "traitType")]
    pub trait_type: String,
    /// Trait value, e.g. "Blue".
    #[serde(deserialize_with = "scalar_to_string")]
    pub value: String,
}

impl TokenAttribute {
    /// Convenience constructor.
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

fn scalar_to_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "attribute value must be a scalar, got {other}"
        ))),
    }
}

/// Per-token metadata as resolved from the content store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Display name.
    pub name: String,
    /// Description text.
    pub description: String,
    /// Image reference as it appears in the source metadata
    /// (usually an `ipfs://` URI).
    pub image: String,
    /// Resolved display URL for the image, if a gateway URL has been derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Ordered attribute list.
    #[serde(default)]
    pub attributes: Vec<TokenAttribute>,
    /// Mean of this token's attribute percentages (lower = rarer).
    /// Derived on read, never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_rarity: Option<f64>,
    /// Ascending-rank percentile of the rarity score (lower = rarer).
    /// Derived on read, never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity_percentile: Option<f64>,
}

impl TokenMetadata {
    /// Look up an attribute value by trait type.
    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| a.value.as_str())
    }

    /// Whether this token carries the exact (trait type, value) pair.
    pub fn has_attribute(&self, trait_type: &str, value: &str) -> bool {
        self.attributes
            .iter()
            .any(|a| a.trait_type == trait_type && a.value == value)
    }
}

/// Live ownership/mint state for a token.
///
/// Ownership changes independently of the immutable metadata and is never
/// served from the metadata cache.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipStatus {
    /// Current owner address, if the token is minted and owned.
    #[serde(default)]
    pub owner: Option<String>,
    /// Whether the token has been minted at all.
    #[serde(default, alias = "isMinted")]
    pub is_minted: bool,
}
