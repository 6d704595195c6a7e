//! Application state shared across handlers.

use std::sync::Arc;
use vitrine_cache::CollectionCache;
use vitrine_core::AppConfig;
use vitrine_pipeline::{
    CollectionService, FetchSessionRegistry, PaginationOrchestrator, PrefetchQueue,
};
use vitrine_resolver::GatewayResolver;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Gateway resolver for the content boundary.
    pub resolver: Arc<GatewayResolver>,
    /// Collection cache.
    pub cache: CollectionCache,
    /// Fetch session registry, for consumer-driven cancellation.
    pub sessions: Arc<FetchSessionRegistry>,
    /// Page entry point.
    pub orchestrator: Arc<PaginationOrchestrator>,
}

impl AppState {
    /// Create a new application state, wiring the pipeline components.
    ///
    /// # Panics
    ///
    /// Panics if configuration validation fails; `main` validates earlier
    /// with a proper error, so this only guards programmatic construction.
    pub fn new(
        config: AppConfig,
        resolver: Arc<GatewayResolver>,
        cache: CollectionCache,
        service: Arc<dyn CollectionService>,
    ) -> Self {
        if let Err(error) = config.validate() {
            panic!("Invalid configuration: {error}");
        }

        let sessions = Arc::new(FetchSessionRegistry::new());
        let prefetch = Arc::new(PrefetchQueue::new(
            resolver.clone(),
            cache.clone(),
            service.clone(),
            config.fetch.clone(),
        ));
        let orchestrator = Arc::new(PaginationOrchestrator::new(
            resolver.clone(),
            cache.clone(),
            service,
            sessions.clone(),
            prefetch,
            config.fetch.clone(),
        ));

        Self {
            config: Arc::new(config),
            resolver,
            cache,
            sessions,
            orchestrator,
        }
    }
}
