//! Artifact resolution for the decision engine
//!
//! Locates or derives the preprocessing and model artifacts the engine
//! needs: a feature scaler, a label encoder, and classifier weights. Each
//! is resolved through a prioritized fallback chain, and every attempted
//! source is recorded in a provenance trail. Resolution never fails: the
//! terminal tier fits both preprocessing artifacts from a built-in
//! reference table, and a missing or unloadable model only downgrades the
//! bundle to simulated mode.

mod labels;
mod reference;
mod resolver;
mod scaler;

pub use labels::LabelEncoder;
pub use reference::{reference_row, ReferenceRow, REFERENCE_ROWS};
pub use resolver::{resolve, ResolverConfig};
pub use scaler::StandardScaler;

use serde::Serialize;

use crate::engine::ThreatModel;

/// How the engine will answer classification requests
pub enum EngineMode {
    /// Trained classifier weights were resolved; predictions run a real
    /// forward pass.
    Real { model: ThreatModel },
    /// No usable weights; predictions come from the feature-influenced
    /// simulator.
    Simulated,
}

impl EngineMode {
    pub fn name(&self) -> &'static str {
        match self {
            EngineMode::Real { .. } => "real",
            EngineMode::Simulated => "simulated",
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, EngineMode::Real { .. })
    }
}

impl std::fmt::Debug for EngineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one attempted artifact source
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ArtifactOutcome {
    /// Deserialized successfully from a file
    Loaded { sha256: String },
    /// Source file does not exist
    Missing,
    /// Source exists but could not be used
    Failed { reason: String },
    /// Derived by fitting over a tabular source
    Fitted { rows: usize },
    /// Derived from the built-in reference table
    BuiltIn,
}

/// One step of the resolution trail
#[derive(Debug, Clone, Serialize)]
pub struct ProvenanceEntry {
    pub source: String,
    #[serde(flatten)]
    pub outcome: ArtifactOutcome,
}

impl ProvenanceEntry {
    pub(crate) fn new(source: impl Into<String>, outcome: ArtifactOutcome) -> Self {
        Self {
            source: source.into(),
            outcome,
        }
    }
}

/// Resolved artifact set shared by all classification requests.
///
/// Constructed once by [`resolve`], then treated as immutable; replacing
/// it (reload) swaps the shared handle atomically.
#[derive(Debug)]
pub struct ArtifactBundle {
    pub scaler: StandardScaler,
    pub labels: LabelEncoder,
    pub mode: EngineMode,
    pub provenance: Vec<ProvenanceEntry>,
}

impl ArtifactBundle {
    pub fn classes(&self) -> &[String] {
        self.labels.classes()
    }
}
