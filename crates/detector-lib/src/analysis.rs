//! Classification results and the analysis record handed to the dashboard
//!
//! A [`ClassificationResult`] is what the engine returns per request; a
//! [`ThreatAnalysis`] wraps it with the caller-facing context the
//! dashboard expects: input features, recommendations, and a coarse risk
//! level derived from the predicted class and confidence.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::FeatureVector;

/// Output of one classification request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Class drawn from the resolved label set
    pub predicted_class: String,
    /// Probability assigned to the predicted class
    pub confidence: f64,
    /// Full class→probability mapping; sums to 1
    pub probabilities: BTreeMap<String, f64>,
}

/// Coarse operator-facing severity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        };
        f.write_str(name)
    }
}

/// Risk bucket for a predicted class at a given confidence
pub fn risk_level(threat_class: &str, confidence: f64) -> RiskLevel {
    let name = threat_class.to_lowercase();
    if name.contains("benign") || name.contains("normal") {
        RiskLevel::Low
    } else if name.contains("ddos") {
        if confidence > 0.8 {
            RiskLevel::Critical
        } else {
            RiskLevel::High
        }
    } else if confidence > 0.8 {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    }
}

/// Playbook suggestions for a predicted class
pub fn recommendations(threat_class: &str) -> Vec<String> {
    let name = threat_class.to_lowercase();
    let items: &[&str] = if name.contains("benign") || name.contains("normal") {
        &[
            "Traffic appears normal - continue monitoring",
            "Regular security audits recommended",
            "Keep security systems updated",
        ]
    } else if name.contains("ddos") {
        &[
            "Block source IP immediately",
            "Activate DDoS protection mechanisms",
            "Scale infrastructure to handle load",
        ]
    } else if name.contains("port") || name.contains("scan") {
        &[
            "Block scanning source IP",
            "Review and strengthen firewall rules",
            "Check for system vulnerabilities",
        ]
    } else {
        &[
            "Investigate traffic source immediately",
            "Implement additional security measures",
            "Contact security team",
        ]
    };
    items.iter().map(|s| s.to_string()).collect()
}

/// Analysis record stored and forwarded to the dashboard bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatAnalysis {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub threat_class: String,
    pub confidence: f64,
    pub probabilities: BTreeMap<String, f64>,
    pub features: HashMap<String, f64>,
    pub recommendations: Vec<String>,
    pub risk_level: RiskLevel,
    /// "real" or "simulated", so consumers can surface the engine mode
    pub mode: String,
}

impl ThreatAnalysis {
    /// Wrap an engine result with caller-facing context
    pub fn from_result(
        result: ClassificationResult,
        features: &FeatureVector,
        mode: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis().to_string(),
            timestamp: now,
            recommendations: recommendations(&result.predicted_class),
            risk_level: risk_level(&result.predicted_class, result.confidence),
            threat_class: result.predicted_class,
            confidence: result.confidence,
            probabilities: result.probabilities,
            features: features.to_named(),
            mode: mode.to_string(),
        }
    }
}
