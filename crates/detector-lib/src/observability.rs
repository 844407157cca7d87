//! Observability infrastructure for the detector service
//!
//! Provides:
//! - Prometheus metrics (classification latency, per-mode counters,
//!   store and forwarding activity, engine mode info)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for classification latency (seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DetectorMetricsInner> = OnceLock::new();

struct DetectorMetricsInner {
    classification_latency_seconds: Histogram,
    classifications_total: IntCounterVec,
    classification_errors_total: IntCounter,
    analyses_recorded_total: IntCounter,
    forward_failures_total: IntCounter,
    engine_mode_info: GaugeVec,
    history_entries: IntGauge,
}

impl DetectorMetricsInner {
    fn new() -> Self {
        Self {
            classification_latency_seconds: register_histogram!(
                "threat_detector_classification_latency_seconds",
                "Time spent classifying one feature vector",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register classification_latency_seconds"),

            classifications_total: register_int_counter_vec!(
                "threat_detector_classifications_total",
                "Classifications served, labeled by engine mode",
                &["mode"]
            )
            .expect("Failed to register classifications_total"),

            classification_errors_total: register_int_counter!(
                "threat_detector_classification_errors_total",
                "Classification requests rejected with an error"
            )
            .expect("Failed to register classification_errors_total"),

            analyses_recorded_total: register_int_counter!(
                "threat_detector_analyses_recorded_total",
                "Analyses recorded into the bounded store"
            )
            .expect("Failed to register analyses_recorded_total"),

            forward_failures_total: register_int_counter!(
                "threat_detector_forward_failures_total",
                "Analyses that could not be delivered downstream"
            )
            .expect("Failed to register forward_failures_total"),

            engine_mode_info: register_gauge_vec!(
                "threat_detector_engine_mode_info",
                "Currently resolved engine mode",
                &["mode"]
            )
            .expect("Failed to register engine_mode_info"),

            history_entries: register_int_gauge!(
                "threat_detector_history_entries",
                "Analyses currently held in the rolling history"
            )
            .expect("Failed to register history_entries"),
        }
    }
}

/// Detector metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct DetectorMetrics {
    _private: (),
}

impl Default for DetectorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DetectorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DetectorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record one classification latency observation
    pub fn observe_classification_latency(&self, duration_secs: f64) {
        self.inner()
            .classification_latency_seconds
            .observe(duration_secs);
    }

    /// Count a served classification under its engine mode
    pub fn inc_classifications(&self, mode: &str) {
        self.inner()
            .classifications_total
            .with_label_values(&[mode])
            .inc();
    }

    pub fn inc_classification_errors(&self) {
        self.inner().classification_errors_total.inc();
    }

    pub fn inc_analyses_recorded(&self) {
        self.inner().analyses_recorded_total.inc();
    }

    pub fn inc_forward_failures(&self) {
        self.inner().forward_failures_total.inc();
    }

    /// Point the mode info gauge at the currently resolved mode
    pub fn set_engine_mode(&self, mode: &str) {
        self.inner().engine_mode_info.reset();
        self.inner()
            .engine_mode_info
            .with_label_values(&[mode])
            .set(1.0);
    }

    pub fn set_history_entries(&self, count: i64) {
        self.inner().history_entries.set(count);
    }
}

/// Structured logger for detector events
///
/// Provides consistent JSON-formatted logging for classifications,
/// artifact resolution, and forwarding outcomes.
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Log a served classification
    pub fn log_classification(
        &self,
        threat_class: &str,
        confidence: f64,
        risk_level: &str,
        mode: &str,
        duration_us: u64,
    ) {
        info!(
            event = "classification_served",
            service = %self.service_name,
            threat_class = %threat_class,
            confidence = confidence,
            risk_level = %risk_level,
            mode = %mode,
            duration_us = duration_us,
            "Classification served"
        );
    }

    /// Log the outcome of an artifact resolution pass
    pub fn log_resolution(&self, mode: &str, classes: usize, steps: usize) {
        if mode == "real" {
            info!(
                event = "artifacts_resolved",
                service = %self.service_name,
                mode = %mode,
                classes = classes,
                steps = steps,
                "Trained classifier resolved"
            );
        } else {
            warn!(
                event = "artifacts_resolved",
                service = %self.service_name,
                mode = %mode,
                classes = classes,
                steps = steps,
                "No trained classifier, serving simulated predictions"
            );
        }
    }

    /// Log an analysis received from an external producer
    pub fn log_ingest(&self, id: &str, threat_class: &str) {
        info!(
            event = "analysis_ingested",
            service = %self.service_name,
            id = %id,
            threat_class = %threat_class,
            "External analysis recorded"
        );
    }

    /// Log a forwarding outcome
    pub fn log_forward(&self, endpoint: &str, delivered: bool) {
        if delivered {
            info!(
                event = "analysis_forwarded",
                service = %self.service_name,
                endpoint = %endpoint,
                delivered = true,
                "Analysis forwarded downstream"
            );
        } else {
            warn!(
                event = "analysis_forwarded",
                service = %self.service_name,
                endpoint = %endpoint,
                delivered = false,
                "Downstream dashboard unreachable"
            );
        }
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, mode: &str) {
        info!(
            event = "service_started",
            service = %self.service_name,
            version = %version,
            mode = %mode,
            "Threat detector started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Threat detector shutting down"
        );
    }
}
