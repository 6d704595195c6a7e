//! Metadata resolution and caching pipeline for Vitrine.
//!
//! This crate coordinates the moving parts of collection browsing:
//! - The upstream collection-service boundary (details, ownership, holdings)
//! - Fetch sessions with cooperative cancellation
//! - The background prefetch queue
//! - The pagination orchestrator assembling fully-populated pages

pub mod error;
mod fetch;
pub mod paginate;
pub mod prefetch;
pub mod session;
pub mod upstream;

pub use error::{PipelineError, PipelineResult};
pub use paginate::{AttributeFilter, Page, PageToken, PaginationOrchestrator};
pub use prefetch::PrefetchQueue;
pub use session::{FetchSession, FetchSessionRegistry};
pub use upstream::{
    AddressCollection, AddressToken, CollectionDetails, CollectionService, HttpCollectionService,
};
