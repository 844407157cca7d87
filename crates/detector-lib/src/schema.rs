//! Fixed feature schema for network-traffic classification
//!
//! Every classification request carries one value per schema feature, in
//! schema order. The list mirrors the training data layout: header/rate
//! fields, TCP flag counts, packet-type counts, protocol-presence
//! indicators, and statistical aggregates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DetectorError;

/// Number of input features expected by the classifier
pub const FEATURE_COUNT: usize = 45;

/// Ordered feature names defining the input contract
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Header_Length",
    "Protocol_Type",
    "Duration",
    "Rate",
    "Srate",
    "Drate",
    "fin_flag_number",
    "syn_flag_number",
    "rst_flag_number",
    "psh_flag_number",
    "ack_flag_number",
    "ece_flag_number",
    "cwr_flag_number",
    "ack_count",
    "syn_count",
    "fin_count",
    "rst_count",
    "HTTP",
    "HTTPS",
    "DNS",
    "Telnet",
    "SMTP",
    "SSH",
    "IRC",
    "TCP",
    "UDP",
    "DHCP",
    "ARP",
    "ICMP",
    "IGMP",
    "IPv",
    "LLC",
    "Tot_sum",
    "Min",
    "Max",
    "AVG",
    "Std",
    "Tot_size",
    "IAT",
    "Number",
    "Magnitude",
    "Radius",
    "Covariance",
    "Variance",
    "Weight",
];

/// Position of a named feature within the schema
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}

/// Ordered feature vector validated against the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    /// Build from an ordered slice; length must match the schema exactly
    pub fn from_slice(values: &[f64]) -> Result<Self, DetectorError> {
        if values.len() != FEATURE_COUNT {
            return Err(DetectorError::ShapeMismatch {
                expected: FEATURE_COUNT,
                actual: values.len(),
            });
        }
        Ok(Self(values.to_vec()))
    }

    /// Build from a name→value map, schema order imposed.
    ///
    /// Names absent from the map default to 0.0, matching the caller
    /// contract of the original form-driven input.
    pub fn from_named(values: &HashMap<String, f64>) -> Self {
        Self(
            FEATURE_NAMES
                .iter()
                .map(|name| values.get(*name).copied().unwrap_or(0.0))
                .collect(),
        )
    }

    /// Value of a named feature; absent names read as 0.0
    pub fn get(&self, name: &str) -> f64 {
        feature_index(name).map(|i| self.0[i]).unwrap_or(0.0)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Name→value view of the vector, for analysis records
    pub fn to_named(&self) -> HashMap<String, f64> {
        FEATURE_NAMES
            .iter()
            .zip(self.0.iter())
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }
}

impl TryFrom<Vec<f64>> for FeatureVector {
    type Error = DetectorError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        if values.len() != FEATURE_COUNT {
            return Err(DetectorError::ShapeMismatch {
                expected: FEATURE_COUNT,
                actual: values.len(),
            });
        }
        Ok(Self(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_has_45_features() {
        assert_eq!(FEATURE_NAMES.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_feature_index_lookup() {
        assert_eq!(feature_index("Header_Length"), Some(0));
        assert_eq!(feature_index("Rate"), Some(3));
        assert_eq!(feature_index("syn_count"), Some(14));
        assert_eq!(feature_index("Weight"), Some(44));
        assert_eq!(feature_index("no_such_feature"), None);
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        let err = FeatureVector::from_slice(&[0.0; 10]).unwrap_err();
        match err {
            DetectorError::ShapeMismatch { expected, actual } => {
                assert_eq!(expected, FEATURE_COUNT);
                assert_eq!(actual, 10);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_named_fills_missing_with_zero() {
        let mut named = HashMap::new();
        named.insert("Rate".to_string(), 50_000.0);
        named.insert("syn_count".to_string(), 1000.0);

        let vector = FeatureVector::from_named(&named);
        assert_eq!(vector.get("Rate"), 50_000.0);
        assert_eq!(vector.get("syn_count"), 1000.0);
        assert_eq!(vector.get("Duration"), 0.0);
        assert_eq!(vector.values().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_named_round_trip() {
        let values: Vec<f64> = (0..FEATURE_COUNT).map(|i| i as f64).collect();
        let vector = FeatureVector::from_slice(&values).unwrap();
        let named = vector.to_named();
        let rebuilt = FeatureVector::from_named(&named);
        assert_eq!(vector, rebuilt);
    }
}
