mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrapeyard_core::metadata::{
    Enricher, FanartImages, ImageProvider, ImageResolver, MetadataProvider, TmdbImages,
    TraktClient,
};
use scrapeyard_core::orchestrator::ItemPipeline;
use scrapeyard_core::reconcile::Reconciler;
use scrapeyard_core::scrape_log::{create_scrape_log, ScrapeLogStore, SqliteScrapeLogStore};
use scrapeyard_core::{
    load_config, validate_config, ContentStore, OrchestratorConfig, ScrapeOrchestrator,
    ScrapeSource, SharedStatus, SqliteContentStore,
};

use api::create_router;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for the scrape error log channel
const SCRAPE_LOG_BUFFER_SIZE: usize = 1000;

/// How long shutdown waits for the error log writer to drain
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("SCRAPEYARD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Sources configured: {}", config.sources.len());

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash = config_hash[..16].to_string();
    info!("Config hash: {}", config_hash);

    // Stores share one database file
    let content_store: Arc<dyn ContentStore> = Arc::new(
        SqliteContentStore::new(&config.database.path)
            .context("Failed to create content store")?,
    );
    info!("Content store initialized");

    let scrape_log_store: Arc<dyn ScrapeLogStore> = Arc::new(
        SqliteScrapeLogStore::new(&config.database.path)
            .context("Failed to create scrape error log")?,
    );
    info!("Scrape error log initialized");

    let (scrape_log_handle, scrape_log_writer) =
        create_scrape_log(Arc::clone(&scrape_log_store), SCRAPE_LOG_BUFFER_SIZE);
    let writer_handle = tokio::spawn(scrape_log_writer.run());

    let status = SharedStatus::new();
    let orchestrator_config = OrchestratorConfig::from(&config.scraper);
    let request_timeout = Duration::from_millis(orchestrator_config.request_timeout_ms);

    // Catalog client is required for scraping
    let catalog: Option<Arc<dyn MetadataProvider>> = match &config.metadata.trakt {
        Some(trakt_config) => match TraktClient::new(trakt_config, request_timeout) {
            Ok(client) => {
                info!("Initializing Trakt catalog at {}", trakt_config.url);
                Some(Arc::new(client))
            }
            Err(e) => {
                error!("Failed to create Trakt client: {}", e);
                None
            }
        },
        None => {
            info!("No catalog configured");
            None
        }
    };

    // Artwork providers, asked in order
    let mut image_providers: Vec<Arc<dyn ImageProvider>> = Vec::new();
    if let Some(tmdb_config) = &config.metadata.tmdb {
        match TmdbImages::new(tmdb_config.clone(), request_timeout) {
            Ok(provider) => image_providers.push(Arc::new(provider)),
            Err(e) => error!("Failed to create TMDB image provider: {}", e),
        }
    }
    if let Some(fanart_config) = &config.metadata.fanart {
        match FanartImages::new(fanart_config.clone(), request_timeout) {
            Ok(provider) => image_providers.push(Arc::new(provider)),
            Err(e) => error!("Failed to create Fanart image provider: {}", e),
        }
    }
    info!("Image providers configured: {}", image_providers.len());

    let mut sources = Vec::new();
    for source_config in config.sources.iter().filter(|s| s.enabled) {
        match ScrapeSource::from_config(source_config, request_timeout) {
            Ok(source) => {
                info!(
                    "Source {} ({}, {:?})",
                    source_config.name,
                    source_config.backend.as_str(),
                    source_config.kind
                );
                sources.push(source);
            }
            Err(e) => error!("Failed to create source {}: {}", source_config.name, e),
        }
    }

    let orchestrator = match catalog {
        Some(catalog) => {
            let retry = orchestrator_config.retry_policy();
            let placeholder = &config.metadata.placeholder_image;
            let enricher = Enricher::new(
                catalog,
                ImageResolver::new(image_providers, placeholder, retry),
                retry,
            );
            let reconciler = Reconciler::new(Arc::clone(&content_store), placeholder);
            let pipeline = ItemPipeline::new(
                Arc::new(enricher),
                Arc::new(reconciler),
                Some(scrape_log_handle.clone()),
            );

            let orch = Arc::new(ScrapeOrchestrator::new(
                orchestrator_config,
                sources,
                Arc::new(pipeline),
                Arc::new(status.clone()),
            ));

            if config.scraper.enabled {
                orch.start();
                info!("Scrape orchestrator started");
            } else {
                info!("Scheduled scraping disabled in config");
            }
            Some(orch)
        }
        None => {
            warn!("Scraping unavailable without a catalog");
            None
        }
    };

    let state = Arc::new(AppState::new(
        config.clone(),
        config_hash,
        status,
        content_store,
        Arc::clone(&scrape_log_store),
        orchestrator.clone(),
    ));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    if let Some(ref orch) = orchestrator {
        info!("Stopping orchestrator...");
        orch.stop().await;
        info!("Orchestrator stopped");
    }

    // The pipeline holds a handle clone; the writer ends once every
    // handle is gone.
    drop(orchestrator);
    drop(scrape_log_handle);

    match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer_handle).await {
        Ok(_) => info!("Scrape log writer stopped"),
        Err(_) => warn!("Scrape log writer did not drain in time"),
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
