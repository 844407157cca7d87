//! Threat-class label encoding
//!
//! Maps class names to stable indices. Fitting sorts the distinct labels
//! lexicographically, matching the encoder the training pipeline used, so
//! model output positions line up with the persisted class order.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DetectorError;

/// Ordered set of threat-class names with stable index assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit over observed labels: distinct values, sorted
    pub fn fit<I, S>(labels: I) -> Result<Self, DetectorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes: Vec<String> = labels
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect();
        classes.sort();
        classes.dedup();

        if classes.is_empty() {
            return Err(DetectorError::Configuration(
                "cannot fit label encoder over an empty label set".to_string(),
            ));
        }
        Ok(Self { classes })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_at(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(|s| s.as_str())
    }

    pub fn index_of(&self, class: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Load a persisted encoder from a JSON file
    pub fn load(path: &Path) -> Result<Self, DetectorError> {
        let source_id = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DetectorError::artifact_load(&source_id, e))?;
        let encoder: Self = serde_json::from_str(&content)
            .map_err(|e| DetectorError::artifact_load(&source_id, e))?;
        if encoder.classes.is_empty() {
            return Err(DetectorError::artifact_load(
                &source_id,
                "encoder file contains no classes",
            ));
        }
        Ok(encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fit_sorts_and_dedups() {
        let encoder =
            LabelEncoder::fit(["Port_Scan", "Benign", "DDoS", "Malware", "Benign"]).unwrap();
        assert_eq!(encoder.classes(), ["Benign", "DDoS", "Malware", "Port_Scan"]);
        assert_eq!(encoder.len(), 4);
    }

    #[test]
    fn test_fit_rejects_empty() {
        assert!(LabelEncoder::fit(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_index_round_trip() {
        let encoder = LabelEncoder::fit(["Benign", "DDoS"]).unwrap();
        assert_eq!(encoder.index_of("DDoS"), Some(1));
        assert_eq!(encoder.class_at(1), Some("DDoS"));
        assert_eq!(encoder.index_of("Unknown"), None);
        assert_eq!(encoder.class_at(5), None);
    }

    #[test]
    fn test_load_rejects_empty_class_set() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"classes":[]}}"#).unwrap();
        assert!(LabelEncoder::load(file.path()).is_err());
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"classes":["Benign","DDoS"]}}"#).unwrap();
        let encoder = LabelEncoder::load(file.path()).unwrap();
        assert_eq!(encoder.len(), 2);
    }
}
