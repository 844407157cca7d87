//! Detector service configuration

use anyhow::Result;
use serde::Deserialize;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Service name used in structured log events
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory searched for artifact files
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Noise standard deviation for simulated predictions
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f64,

    /// Downstream dashboard ingest URL; forwarding is off when unset
    #[serde(default)]
    pub forward_endpoint: Option<String>,

    /// File persisting the analysis store across restarts; off when unset
    #[serde(default)]
    pub history_file: Option<String>,
}

fn default_service_name() -> String {
    std::env::var("SERVICE_NAME").unwrap_or_else(|_| "threat-detector".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_artifact_dir() -> String {
    "artifacts".to_string()
}

fn default_noise_scale() -> f64 {
    detector_lib::DEFAULT_NOISE_SCALE
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            api_port: default_api_port(),
            artifact_dir: default_artifact_dir(),
            noise_scale: default_noise_scale(),
            forward_endpoint: None,
            history_file: None,
        }
    }
}

impl DetectorConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("DETECTOR"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.artifact_dir, "artifacts");
        assert!((config.noise_scale - 0.30).abs() < 1e-12);
        assert!(config.forward_endpoint.is_none());
        assert!(config.history_file.is_none());
    }
}
