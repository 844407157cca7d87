//! Bounded analysis store backing the dashboard bridge
//!
//! Holds the latest analysis plus a rolling history of the most recent
//! fifty, oldest evicted first. Optionally persists the whole store to a
//! JSON file so a restarted bridge comes back with its history.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::analysis::ThreatAnalysis;

/// Analyses retained in history before the oldest is evicted
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    latest_analysis: Option<ThreatAnalysis>,
    analysis_history: VecDeque<ThreatAnalysis>,
    last_updated: Option<DateTime<Utc>>,
}

/// Shared store of received analyses
#[derive(Debug, Clone)]
pub struct AnalysisStore {
    state: Arc<RwLock<StoreState>>,
    persist_path: Option<PathBuf>,
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            persist_path: None,
        }
    }

    /// Create a store persisted at `path`, loading prior contents when the
    /// file exists. A corrupt or unreadable file starts the store fresh.
    pub async fn with_persistence(path: PathBuf) -> Self {
        let mut state = StoreState::default();
        if path.exists() {
            match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<StoreState>(&bytes) {
                    Ok(loaded) => {
                        debug!(entries = loaded.analysis_history.len(), "Loaded persisted analyses");
                        state = loaded;
                    }
                    Err(e) => warn!(error = %e, "Persisted store unreadable, starting fresh"),
                },
                Err(e) => warn!(error = %e, "Failed to read persisted store, starting fresh"),
            }
        }
        Self {
            state: Arc::new(RwLock::new(state)),
            persist_path: Some(path),
        }
    }

    /// Record an analysis as the latest and append it to history
    pub async fn record(&self, analysis: ThreatAnalysis) {
        let mut state = self.state.write().await;
        state.last_updated = Some(Utc::now());
        state.latest_analysis = Some(analysis.clone());
        state.analysis_history.push_back(analysis);
        while state.analysis_history.len() > HISTORY_LIMIT {
            state.analysis_history.pop_front();
        }

        if let Some(path) = &self.persist_path {
            match serde_json::to_vec_pretty(&*state) {
                Ok(bytes) => {
                    if let Err(e) = tokio::fs::write(path, bytes).await {
                        warn!(error = %e, "Failed to persist analysis store");
                    }
                }
                Err(e) => warn!(error = %e, "Failed to serialize analysis store"),
            }
        }
    }

    pub async fn latest(&self) -> Option<ThreatAnalysis> {
        self.state.read().await.latest_analysis.clone()
    }

    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_updated
    }

    /// Full history, oldest first
    pub async fn history(&self) -> Vec<ThreatAnalysis> {
        self.state.read().await.analysis_history.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.analysis_history.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.analysis_history.is_empty()
    }
}

impl Default for AnalysisStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ClassificationResult, ThreatAnalysis};
    use crate::schema::FeatureVector;
    use std::collections::{BTreeMap, HashMap};

    fn analysis(class: &str) -> ThreatAnalysis {
        let mut probabilities = BTreeMap::new();
        probabilities.insert(class.to_string(), 1.0);
        let result = ClassificationResult {
            predicted_class: class.to_string(),
            confidence: 1.0,
            probabilities,
        };
        let vector = FeatureVector::from_named(&HashMap::new());
        ThreatAnalysis::from_result(result, &vector, "simulated")
    }

    #[tokio::test]
    async fn test_record_updates_latest_and_history() {
        let store = AnalysisStore::new();
        assert!(store.latest().await.is_none());
        assert!(store.last_updated().await.is_none());

        store.record(analysis("DDoS")).await;
        store.record(analysis("Benign")).await;

        assert_eq!(store.latest().await.unwrap().threat_class, "Benign");
        assert_eq!(store.len().await, 2);
        assert!(store.last_updated().await.is_some());
        // oldest first
        assert_eq!(store.history().await[0].threat_class, "DDoS");
    }

    #[tokio::test]
    async fn test_history_evicts_oldest_beyond_limit() {
        let store = AnalysisStore::new();
        for i in 0..HISTORY_LIMIT + 5 {
            let class = if i < 5 { "Old" } else { "New" };
            store.record(analysis(class)).await;
        }

        let history = store.history().await;
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert!(history.iter().all(|a| a.threat_class == "New"));
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analyses.json");

        let store = AnalysisStore::with_persistence(path.clone()).await;
        store.record(analysis("Port_Scan")).await;
        drop(store);

        let reloaded = AnalysisStore::with_persistence(path).await;
        assert_eq!(reloaded.len().await, 1);
        assert_eq!(reloaded.latest().await.unwrap().threat_class, "Port_Scan");
    }

    #[tokio::test]
    async fn test_corrupt_persistence_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analyses.json");
        tokio::fs::write(&path, b"garbage").await.unwrap();

        let store = AnalysisStore::with_persistence(path).await;
        assert!(store.is_empty().await);
    }
}
