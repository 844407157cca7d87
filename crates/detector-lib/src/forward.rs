//! Downstream forwarding of analyses
//!
//! Pushes each recorded analysis to an external dashboard bridge over
//! plain HTTP. Delivery is best-effort: a dashboard that is offline or
//! slow must never fail the classification request that produced the
//! analysis, so errors are returned for logging and otherwise dropped.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::analysis::ThreatAnalysis;

/// Timeout for one forwarding attempt
const FORWARD_TIMEOUT: Duration = Duration::from_secs(3);

/// HTTP client pushing analyses to a downstream dashboard bridge
#[derive(Debug, Clone)]
pub struct ForwardClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ForwardClient {
    /// Create a client for the given ingest endpoint URL
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FORWARD_TIMEOUT)
            .build()
            .context("Failed to create forwarding HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Deliver one analysis downstream
    pub async fn send(&self, analysis: &ThreatAnalysis) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(analysis)
            .send()
            .await
            .context("Failed to reach downstream dashboard")?;

        if !response.status().is_success() {
            anyhow::bail!("Downstream dashboard answered {}", response.status());
        }
        debug!(endpoint = %self.endpoint, id = %analysis.id, "Analysis forwarded");
        Ok(())
    }
}
