//! Feature standardization
//!
//! Column-wise standardizing scaler matching the semantics of the
//! preprocessing used at training time: per-column mean subtraction and
//! division by the population standard deviation. Zero-variance columns
//! keep a scale of 1.0 so transforming them is a no-op shift.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DetectorError;

/// Fitted standardizing scaler over the schema columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit over rows of equal width; at least one row is required
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, DetectorError> {
        let width = rows.first().map(|r| r.len()).ok_or_else(|| {
            DetectorError::Configuration("cannot fit scaler over an empty row set".to_string())
        })?;
        if rows.iter().any(|r| r.len() != width) {
            return Err(DetectorError::Configuration(
                "cannot fit scaler over rows of unequal width".to_string(),
            ));
        }

        let count = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in mean.iter_mut() {
            *m /= count;
        }

        let mut scale = vec![0.0; width];
        for row in rows {
            for ((s, m), v) in scale.iter_mut().zip(&mean).zip(row) {
                *s += (v - m).powi(2);
            }
        }
        for s in scale.iter_mut() {
            *s = (*s / count).sqrt();
            // constant columns pass through unscaled
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Ok(Self { mean, scale })
    }

    /// Standardize a vector of the fitted width
    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    /// Number of columns the scaler was fitted over
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Load a persisted scaler from a JSON file
    pub fn load(path: &Path) -> Result<Self, DetectorError> {
        let source_id = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DetectorError::artifact_load(&source_id, e))?;
        serde_json::from_str(&content).map_err(|e| DetectorError::artifact_load(&source_id, e))
    }
}
