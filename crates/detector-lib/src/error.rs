//! Error taxonomy for the detector library

use thiserror::Error;

/// Errors surfaced by the detector library
#[derive(Debug, Error)]
pub enum DetectorError {
    /// Feature vector length does not match the schema
    #[error("feature vector has {actual} values, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// An artifact source could not be read or deserialized.
    ///
    /// The resolver absorbs these internally and records them in
    /// provenance; they only escape through explicit load helpers.
    #[error("failed to load artifact from {source_id}: {reason}")]
    ArtifactLoad { source_id: String, reason: String },

    /// The resolved class set is empty. Unreachable when resolution ran,
    /// since the built-in reference tier always yields four classes.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl DetectorError {
    pub fn artifact_load(source_id: impl ToString, reason: impl ToString) -> Self {
        Self::ArtifactLoad {
            source_id: source_id.to_string(),
            reason: reason.to_string(),
        }
    }
}
