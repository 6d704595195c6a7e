//! Core domain types and shared logic for the Vitrine collection browser.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Content identifiers for the decentralized store
//! - Collection ticks
//! - Token metadata and ownership status
//! - Trait-rarity statistics
//! - Application configuration

pub mod config;
pub mod content_id;
pub mod error;
pub mod rarity;
pub mod tick;
pub mod token;

pub use config::{
    AppConfig, CacheConfig, FetchConfig, GatewayConfig, ServerConfig, UpstreamConfig,
};
pub use content_id::ContentIdentifier;
pub use error::{Error, Result};
pub use rarity::{TraitCount, TraitRarityTable};
pub use tick::Tick;
pub use token::{OwnershipStatus, TokenAttribute, TokenMetadata};
