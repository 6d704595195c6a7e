//! Vitrine server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vitrine_core::AppConfig;
use vitrine_pipeline::{CollectionService, HttpCollectionService};
use vitrine_server::{AppState, create_router};

/// Vitrine - a collection metadata browser
#[derive(Parser, Debug)]
#[command(name = "vitrined")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "VITRINE_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Vitrine v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override
    // everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();

    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}, using defaults", args.config);
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("VITRINE_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;

    // Initialize the gateway resolver
    let resolver = vitrine_resolver::from_config(&config.gateway)
        .context("failed to initialize gateway resolver")?;
    tracing::info!(
        gateways = resolver.gateway_count(),
        "Gateway resolver initialized"
    );

    // Initialize the collection cache and verify the store is reachable
    // before accepting requests.
    let cache = vitrine_cache::from_config(&config.cache)
        .await
        .context("failed to initialize collection cache")?;
    cache
        .health_check()
        .await
        .context("cache store health check failed")?;
    tracing::info!(path = %config.cache.path.display(), "Collection cache initialized");

    // Upstream collection-service client
    let service: Arc<dyn CollectionService> = Arc::new(
        HttpCollectionService::new(&config.upstream)
            .context("failed to initialize upstream client")?,
    );
    tracing::info!(base_url = %config.upstream.base_url, "Upstream client initialized");

    // Create application state and router
    let bind = config.server.bind.clone();
    let state = AppState::new(config, resolver, cache, service);
    let app = create_router(state);

    // Parse bind address and serve
    let addr: SocketAddr = bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
