//! API client for communicating with the detector service

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the detector service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }
}

// API request/response types

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyRequest {
    pub features: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatAnalysis {
    pub id: String,
    pub timestamp: String,
    pub threat_class: String,
    pub confidence: f64,
    pub probabilities: BTreeMap<String, f64>,
    #[serde(default)]
    pub features: HashMap<String, f64>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub risk_level: String,
    #[serde(default)]
    pub mode: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestEnvelope {
    pub status: String,
    pub data: Option<ThreatAnalysis>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEnvelope {
    pub status: String,
    pub count: usize,
    pub data: Vec<ThreatAnalysis>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvenanceEntry {
    pub source: String,
    pub outcome: String,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub rows: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineStatus {
    pub mode: String,
    pub classes: Vec<String>,
    pub noise_scale: f64,
    pub provenance: Vec<ProvenanceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReloadResponse {
    pub status: String,
    pub mode: String,
    pub classes: Vec<String>,
    pub steps: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_latest_parses_envelope() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/threat-analysis")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":"success","data":{"id":"1","timestamp":"2026-01-01T00:00:00Z",
                "threat_class":"DDoS","confidence":0.9,"probabilities":{"DDoS":0.9,"Benign":0.1},
                "risk_level":"Critical","mode":"simulated"},"last_updated":"2026-01-01T00:00:00Z"}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let envelope: LatestEnvelope = client.get("api/threat-analysis").await.unwrap();

        mock.assert_async().await;
        assert_eq!(envelope.status, "success");
        let analysis = envelope.data.unwrap();
        assert_eq!(analysis.threat_class, "DDoS");
        assert_eq!(analysis.risk_level, "Critical");
    }

    #[tokio::test]
    async fn test_api_error_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/threat-analysis")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let result: Result<LatestEnvelope> = client.get("api/threat-analysis").await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("API error"), "{err}");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
