//! Feature-influenced stochastic classifier stand-in
//!
//! When no trained weights resolve, predictions come from here: a handful
//! of traffic signals are turned into bounded per-category influence
//! scores, mapped onto the resolved class names, perturbed with fresh
//! Gaussian noise, and normalized into a probability distribution that is
//! sharpened when the aggregate signal is strong. Repeated calls on the
//! same input intentionally differ: the noise draw is never seeded or
//! cached, so the stand-in does not masquerade as a deterministic model.

use rand_distr::{Distribution, Normal};

use crate::error::DetectorError;
use crate::schema::FeatureVector;

/// Default noise standard deviation for simulated predictions
pub const DEFAULT_NOISE_SCALE: f64 = 0.30;

/// Added to every raw score so no class carries exactly zero mass
const SCORE_EPSILON: f64 = 0.001;

/// Lower clip applied after the noise draw
const SCORE_FLOOR: f64 = 0.001;

/// Score for class names no keyword rule matches
const UNMATCHED_CLASS_SCORE: f64 = 0.05;

/// Bounded per-category influence scores derived from the input vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfluenceScores {
    /// Volumetric flood pressure (rate + SYN volume)
    pub flood: f64,
    /// Probe/scan pressure (SYN + RST counts)
    pub scan: f64,
    /// Long-lived low-rate connection pressure
    pub persistence: f64,
    /// Residual benign mass once attack pressure is subtracted
    pub benign: f64,
}

/// Compute influence scores, each clamped to [0, 1]
pub fn influence_scores(vector: &FeatureVector) -> InfluenceScores {
    let rate = vector.get("Rate");
    let syn = vector.get("syn_count");
    let rst = vector.get("rst_count");
    let duration = vector.get("Duration");

    let flood = (rate / 50_000.0 + syn / 2_000.0).min(1.0);
    let scan = (syn / 500.0 + rst / 300.0).min(1.0);
    let persistence = (duration / 60.0 + ((500.0 - rate) / 10_000.0).max(0.0)).min(1.0);
    let benign = (1.0 - 0.6 * flood - 0.5 * scan - 0.5 * persistence).max(0.0);

    InfluenceScores {
        flood,
        scan,
        persistence,
        benign,
    }
}

/// Deterministic pre-noise scores, one per class, keyword-matched on the
/// class name.
///
/// The matching is deliberately the same brittle contains-check the
/// training pipeline's dashboard used: a class name carrying none of the
/// known keywords falls to a small constant floor.
pub fn raw_scores(vector: &FeatureVector, classes: &[String]) -> Vec<f64> {
    let scores = influence_scores(vector);
    classes
        .iter()
        .map(|class| {
            let name = class.to_lowercase();
            let score = if name.contains("ddos") {
                scores.flood
            } else if name.contains("port") || name.contains("scan") || name.contains("recon") {
                scores.scan
            } else if name.contains("malware") {
                scores.persistence
            } else if name.contains("benign") || name.contains("normal") {
                scores.benign
            } else {
                UNMATCHED_CLASS_SCORE
            };
            score + SCORE_EPSILON
        })
        .collect()
}

/// Produce a probability distribution over `classes` for the vector.
///
/// Noise is drawn fresh on every call. With `noise_scale` 0 the result is
/// fully determined by the input.
pub fn simulate(
    vector: &FeatureVector,
    classes: &[String],
    noise_scale: f64,
) -> Result<Vec<f64>, DetectorError> {
    if classes.is_empty() {
        return Err(DetectorError::Configuration(
            "simulated classification requires a non-empty class set".to_string(),
        ));
    }
    let noise = Normal::new(0.0, noise_scale).map_err(|e| {
        DetectorError::Configuration(format!("invalid noise scale {noise_scale}: {e}"))
    })?;

    let mut rng = rand::thread_rng();
    let mut raw = raw_scores(vector, classes);
    for score in raw.iter_mut() {
        *score = (*score + noise.sample(&mut rng)).max(SCORE_FLOOR);
    }

    let total: f64 = raw.iter().sum();
    let mut probs: Vec<f64> = raw.iter().map(|s| s / total).collect();

    // strong aggregate signal sharpens the distribution toward its peak
    let suspiciousness = total - classes.len() as f64 * UNMATCHED_CLASS_SCORE;
    let sharpen = 1.0 + suspiciousness.min(2.0);
    for p in probs.iter_mut() {
        *p = p.powf(sharpen);
    }
    let norm: f64 = probs.iter().sum();
    for p in probs.iter_mut() {
        *p /= norm;
    }

    Ok(probs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::reference_row;
    use crate::schema::FeatureVector;
    use std::collections::HashMap;

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn vector_with(values: &[(&str, f64)]) -> FeatureVector {
        let named: HashMap<String, f64> = values
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();
        FeatureVector::from_named(&named)
    }

    #[test]
    fn test_probabilities_form_a_simplex() {
        let vector = vector_with(&[("Rate", 20_000.0), ("syn_count", 400.0)]);
        let classes = classes(&["Benign", "DDoS", "Malware", "Port_Scan"]);

        for noise in [0.0, 0.30] {
            let probs = simulate(&vector, &classes, noise).unwrap();
            assert_eq!(probs.len(), 4);
            let sum: f64 = probs.iter().sum();
            assert!((sum - 1.0).abs() < 1e-6, "sum was {sum}");
            assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_zero_noise_is_deterministic() {
        let vector = vector_with(&[("Rate", 5_000.0), ("Duration", 10.0)]);
        let classes = classes(&["Benign", "DDoS", "Malware", "Port_Scan"]);

        let first = simulate(&vector, &classes, 0.0).unwrap();
        let second = simulate(&vector, &classes, 0.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_pre_noise_scores_are_stable() {
        let vector = vector_with(&[("Rate", 5_000.0), ("syn_count", 50.0)]);
        let classes = classes(&["Benign", "DDoS"]);
        assert_eq!(raw_scores(&vector, &classes), raw_scores(&vector, &classes));
    }

    #[test]
    fn test_empty_class_set_is_a_configuration_error() {
        let vector = vector_with(&[]);
        let err = simulate(&vector, &[], 0.1).unwrap_err();
        assert!(matches!(err, DetectorError::Configuration(_)));
    }

    #[test]
    fn test_flood_score_monotone_in_rate_and_syn() {
        let low = influence_scores(&vector_with(&[("Rate", 1_000.0), ("syn_count", 10.0)]));
        let high = influence_scores(&vector_with(&[("Rate", 30_000.0), ("syn_count", 500.0)]));
        assert!(high.flood >= low.flood);

        // and clamped at 1 for extreme values
        let extreme = influence_scores(&vector_with(&[("Rate", 1e9), ("syn_count", 1e9)]));
        assert_eq!(extreme.flood, 1.0);
    }

    #[test]
    fn test_ddos_reference_row_peaks_on_flood_class() {
        let row = reference_row("DDoS").unwrap();
        let vector = FeatureVector::from_slice(&row.features).unwrap();
        let classes = classes(&["Benign", "DDoS", "Malware", "Port_Scan"]);

        let raw = raw_scores(&vector, &classes);
        let ddos_idx = 1;
        let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // the flood class sits at the distribution's peak (the scan score
        // saturates too for this row, so the peak may be shared)
        assert_eq!(raw[ddos_idx], max);
        assert!(raw[ddos_idx] > raw[0], "flood must beat benign");
        assert!(raw[ddos_idx] > raw[2], "flood must beat malware");
    }

    #[test]
    fn test_unmatched_class_gets_floor_score() {
        let vector = vector_with(&[("Rate", 50_000.0)]);
        let raw = raw_scores(&vector, &classes(&["Mystery_Category"]));
        assert!((raw[0] - (UNMATCHED_CLASS_SCORE + SCORE_EPSILON)).abs() < 1e-12);
    }

    #[test]
    fn test_keyword_matching_is_case_insensitive() {
        let vector = vector_with(&[("Rate", 50_000.0), ("syn_count", 2_000.0)]);
        let upper = raw_scores(&vector, &classes(&["DDOS-ACK"]));
        let lower = raw_scores(&vector, &classes(&["ddos-ack"]));
        assert_eq!(upper, lower);
        // flood is saturated for this vector
        assert!((upper[0] - (1.0 + SCORE_EPSILON)).abs() < 1e-12);
    }

    #[test]
    fn test_negative_noise_scale_is_rejected() {
        let vector = vector_with(&[]);
        let classes = classes(&["Benign"]);
        assert!(simulate(&vector, &classes, -0.5).is_err());
    }
}
