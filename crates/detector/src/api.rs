//! HTTP API: classification, the dashboard bridge contract, probes and metrics

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use detector_lib::{
    analysis::{recommendations, risk_level, RiskLevel, ThreatAnalysis},
    artifacts::{resolve, ArtifactBundle, ResolverConfig},
    engine::DecisionEngine,
    error::DetectorError,
    forward::ForwardClient,
    health::{components, ComponentStatus, HealthRegistry},
    observability::{DetectorMetrics, StructuredLogger},
    schema::FeatureVector,
    store::AnalysisStore,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Shared application state
pub struct AppState {
    /// Resolved artifacts; reload swaps the inner Arc atomically so
    /// in-flight requests keep the snapshot they started with
    pub bundle: RwLock<Arc<ArtifactBundle>>,
    pub engine: DecisionEngine,
    pub store: AnalysisStore,
    pub health_registry: HealthRegistry,
    pub metrics: DetectorMetrics,
    pub logger: StructuredLogger,
    pub forwarder: Option<ForwardClient>,
    pub resolver_config: ResolverConfig,
}

/// Feature payload accepted by the classify endpoint: the ordered
/// 45-value form, or the named form the dashboard submits
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FeatureInput {
    Ordered(Vec<f64>),
    Named(HashMap<String, f64>),
}

impl FeatureInput {
    fn into_vector(self) -> Result<FeatureVector, DetectorError> {
        match self {
            FeatureInput::Ordered(values) => FeatureVector::try_from(values),
            FeatureInput::Named(named) => Ok(FeatureVector::from_named(&named)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub features: FeatureInput,
}

/// Externally produced analysis accepted by the bridge ingest endpoint
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub threat_class: String,
    pub confidence: f64,
    #[serde(default)]
    pub probabilities: BTreeMap<String, f64>,
    #[serde(default)]
    pub features: HashMap<String, f64>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub risk_level: Option<RiskLevel>,
    pub mode: Option<String>,
}

/// Run the engine against the current bundle and record the analysis
async fn classify(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClassifyRequest>,
) -> impl IntoResponse {
    let start = Instant::now();

    let vector = match request.features.into_vector() {
        Ok(vector) => vector,
        Err(e) => {
            state.metrics.inc_classification_errors();
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
                .into_response();
        }
    };

    let bundle = state.bundle.read().await.clone();
    let result = match state.engine.classify(&bundle, &vector) {
        Ok(result) => result,
        Err(e) => {
            state.metrics.inc_classification_errors();
            warn!(error = %e, "Classification failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
                .into_response();
        }
    };

    let analysis = ThreatAnalysis::from_result(result, &vector, bundle.mode.name());
    let duration = start.elapsed();
    state
        .metrics
        .observe_classification_latency(duration.as_secs_f64());
    state.metrics.inc_classifications(bundle.mode.name());
    state.logger.log_classification(
        &analysis.threat_class,
        analysis.confidence,
        &analysis.risk_level.to_string(),
        &analysis.mode,
        duration.as_micros() as u64,
    );

    record_analysis(&state, analysis.clone()).await;
    forward_analysis(&state, analysis.clone());

    (StatusCode::OK, Json(analysis)).into_response()
}

/// Receive an analysis from an external producer
async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestRequest>,
) -> impl IntoResponse {
    let now = Utc::now();
    let analysis = ThreatAnalysis {
        id: now.timestamp_millis().to_string(),
        timestamp: now,
        risk_level: request
            .risk_level
            .unwrap_or_else(|| risk_level(&request.threat_class, request.confidence)),
        recommendations: if request.recommendations.is_empty() {
            recommendations(&request.threat_class)
        } else {
            request.recommendations
        },
        threat_class: request.threat_class,
        confidence: request.confidence,
        probabilities: request.probabilities,
        features: request.features,
        mode: request.mode.unwrap_or_else(|| "external".to_string()),
    };

    state.logger.log_ingest(&analysis.id, &analysis.threat_class);
    record_analysis(&state, analysis).await;

    Json(json!({ "status": "success", "message": "Analysis data received" }))
}

async fn record_analysis(state: &Arc<AppState>, analysis: ThreatAnalysis) {
    state.store.record(analysis).await;
    state.metrics.inc_analyses_recorded();
    state
        .metrics
        .set_history_entries(state.store.len().await as i64);
}

fn forward_analysis(state: &Arc<AppState>, analysis: ThreatAnalysis) {
    let Some(forwarder) = state.forwarder.clone() else {
        return;
    };
    let logger = state.logger.clone();
    let metrics = state.metrics.clone();
    tokio::spawn(async move {
        match forwarder.send(&analysis).await {
            Ok(()) => logger.log_forward(forwarder.endpoint(), true),
            Err(_) => {
                metrics.inc_forward_failures();
                logger.log_forward(forwarder.endpoint(), false);
            }
        }
    });
}

/// Latest analysis for the dashboard
async fn latest(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let latest = state.store.latest().await;
    let last_updated = state.store.last_updated().await;
    Json(json!({
        "status": "success",
        "data": latest,
        "last_updated": last_updated,
    }))
}

/// Analysis history for the dashboard, oldest first
async fn history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let history = state.store.history().await;
    Json(json!({
        "status": "success",
        "count": history.len(),
        "data": history,
    }))
}

/// Dashboard-facing liveness summary
async fn api_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "last_analysis": state.store.last_updated().await,
    }))
}

/// Engine mode, class set and the artifact provenance trail
async fn engine_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let bundle = state.bundle.read().await.clone();
    Json(json!({
        "mode": bundle.mode.name(),
        "classes": bundle.classes(),
        "noise_scale": state.engine.noise_scale(),
        "provenance": bundle.provenance,
    }))
}

/// Re-run artifact resolution and swap the shared bundle
async fn reload(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resolver_config = state.resolver_config.clone();
    let resolved = tokio::task::spawn_blocking(move || resolve(&resolver_config)).await;

    let bundle = match resolved {
        Ok(bundle) => bundle,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
                .into_response();
        }
    };

    let mode = bundle.mode.name();
    let classes = bundle.classes().to_vec();
    let steps = bundle.provenance.len();

    state.metrics.set_engine_mode(mode);
    if bundle.mode.is_real() {
        state.health_registry.set_healthy(components::ENGINE).await;
    } else {
        state
            .health_registry
            .set_degraded(components::ENGINE, "no trained classifier, serving simulated predictions")
            .await;
    }
    state.logger.log_resolution(mode, classes.len(), steps);

    *state.bundle.write().await = Arc::new(bundle);
    info!(mode = %mode, "Artifact bundle reloaded");

    Json(json!({
        "status": "success",
        "mode": mode,
        "classes": classes,
        "steps": steps,
    }))
    .into_response()
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/classify", post(classify))
        .route("/api/threat-analysis", post(ingest).get(latest))
        .route("/api/threat-analysis/history", get(history))
        .route("/api/health", get(api_health))
        .route("/api/engine", get(engine_status))
        .route("/api/reload", post(reload))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
