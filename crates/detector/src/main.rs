//! Network Threat Detector service
//!
//! Resolves classification artifacts once at startup, then serves the
//! classification endpoint and the dashboard bridge contract over HTTP.

use std::sync::Arc;

use anyhow::Result;
use detector_lib::{
    artifacts::ResolverConfig,
    engine::DecisionEngine,
    forward::ForwardClient,
    health::{components, HealthRegistry},
    observability::{DetectorMetrics, StructuredLogger},
    store::AnalysisStore,
};
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const DETECTOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting threat-detector");

    // Load configuration
    let config = config::DetectorConfig::load()?;
    info!(
        port = config.api_port,
        artifact_dir = %config.artifact_dir,
        "Service configured"
    );

    // Resolve artifacts once; the bundle is shared read-only from here on
    let resolver_config = ResolverConfig::with_dir(&config.artifact_dir);
    let bundle = Arc::new(detector_lib::resolve(&resolver_config));

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::ARTIFACTS).await;
    health_registry.register(components::ENGINE).await;
    health_registry.register(components::STORE).await;
    if config.forward_endpoint.is_some() {
        health_registry.register(components::FORWARDER).await;
    }
    if !bundle.mode.is_real() {
        health_registry
            .set_degraded(
                components::ENGINE,
                "no trained classifier, serving simulated predictions",
            )
            .await;
    }

    // Initialize metrics
    let metrics = DetectorMetrics::new();
    metrics.set_engine_mode(bundle.mode.name());

    // Initialize structured logger
    let logger = StructuredLogger::new(&config.service_name);
    logger.log_resolution(
        bundle.mode.name(),
        bundle.classes().len(),
        bundle.provenance.len(),
    );
    logger.log_startup(DETECTOR_VERSION, bundle.mode.name());

    // Analysis store, persisted when configured
    let store = match &config.history_file {
        Some(path) => AnalysisStore::with_persistence(path.into()).await,
        None => AnalysisStore::new(),
    };
    metrics.set_history_entries(store.len().await as i64);

    // Downstream forwarding, when configured
    let forwarder = match &config.forward_endpoint {
        Some(endpoint) => Some(ForwardClient::new(endpoint)?),
        None => None,
    };

    // Create shared application state
    let app_state = Arc::new(api::AppState {
        bundle: RwLock::new(bundle),
        engine: DecisionEngine::new(config.noise_scale),
        store,
        health_registry: health_registry.clone(),
        metrics,
        logger: logger.clone(),
        forwarder,
        resolver_config,
    });

    // Mark service as ready after initialization
    health_registry.set_ready(true).await;

    // Start the API server
    let _api_server = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
