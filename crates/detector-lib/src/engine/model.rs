//! ONNX classifier wrapper
//!
//! Loads trained classifier weights via tract-onnx and exposes a plain
//! forward pass over one scaled feature vector. The output arity is
//! checked against the resolved class count with a probe inference at load
//! time, so a weights file trained against a different class set is
//! rejected before it can serve traffic.

use anyhow::{Context, Result};
use tract_onnx::prelude::*;

use crate::schema::FEATURE_COUNT;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Trained threat classifier sized to (schema length, class count)
pub struct ThreatModel {
    plan: TractModel,
    class_count: usize,
}

impl ThreatModel {
    /// Load and validate weights from raw ONNX bytes
    pub fn from_bytes(bytes: &[u8], class_count: usize) -> Result<Self> {
        let plan = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, FEATURE_COUNT]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;

        let model = Self { plan, class_count };
        let probe = model.forward(&[0.0; FEATURE_COUNT])?;
        if probe.len() != class_count {
            anyhow::bail!(
                "Model emits {} outputs, resolved class set has {}",
                probe.len(),
                class_count
            );
        }
        Ok(model)
    }

    /// Run one forward pass over a scaled feature vector, returning the
    /// raw per-class outputs
    pub fn forward(&self, features: &[f64]) -> Result<Vec<f64>> {
        let data: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, FEATURE_COUNT), data)
            .context("Failed to shape input tensor")?
            .into();

        let result = self.plan.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let view = output.to_array_view::<f32>()?;
        Ok(view.iter().map(|v| *v as f64).collect())
    }

    pub fn class_count(&self) -> usize {
        self.class_count
    }
}
