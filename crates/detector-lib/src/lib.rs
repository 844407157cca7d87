//! Core library for the network threat detector
//!
//! This crate provides the heart of the system:
//! - Fixed 45-feature traffic schema and validated feature vectors
//! - Cascading artifact resolution (scaler, label encoder, classifier
//!   weights) with a provenance trail and built-in terminal fallback
//! - The decision engine serving real and simulated classification
//!   through one contract
//! - Analysis records, the bounded analysis store, and downstream
//!   forwarding
//! - Health checks and observability

pub mod analysis;
pub mod artifacts;
pub mod engine;
pub mod error;
pub mod forward;
pub mod health;
pub mod observability;
pub mod schema;
pub mod store;

pub use analysis::{recommendations, risk_level, ClassificationResult, RiskLevel, ThreatAnalysis};
pub use artifacts::{resolve, ArtifactBundle, EngineMode, LabelEncoder, ResolverConfig, StandardScaler};
pub use engine::{DecisionEngine, DEFAULT_NOISE_SCALE};
pub use error::DetectorError;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use observability::{DetectorMetrics, StructuredLogger};
pub use schema::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use store::{AnalysisStore, HISTORY_LIMIT};
