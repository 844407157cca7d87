//! Cascading artifact resolution
//!
//! Tiers, tried in order and recorded in provenance:
//! 1. prioritized candidate files for the scaler and label encoder,
//! 2. fitting over a tabular training-features source,
//! 3. fitting over the built-in reference table (always succeeds).
//! Classifier weights are resolved independently last; any failure there
//! leaves the bundle in simulated mode instead of aborting.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::{
    ArtifactBundle, ArtifactOutcome, EngineMode, LabelEncoder, ProvenanceEntry, StandardScaler,
    REFERENCE_ROWS,
};
use crate::engine::ThreatModel;
use crate::schema::{FEATURE_COUNT, FEATURE_NAMES};

/// Candidate sources consulted during resolution
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Directory holding all artifact files
    pub artifact_dir: PathBuf,
    /// Scaler file names, highest priority first
    pub scaler_candidates: Vec<String>,
    /// Label-encoder file names, highest priority first
    pub encoder_candidates: Vec<String>,
    /// Tabular training-features file (optional `Label` column)
    pub training_file: String,
    /// Classifier weights file
    pub model_file: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("artifacts"),
            scaler_candidates: vec![
                "scaler.json".to_string(),
                "scaler_from_synth.json".to_string(),
            ],
            encoder_candidates: vec![
                "label_encoder.json".to_string(),
                "label_encoder_from_synth.json".to_string(),
            ],
            training_file: "train_features.csv".to_string(),
            model_file: "model.onnx".to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: dir.into(),
            ..Self::default()
        }
    }
}

/// Result of reading and deserializing one candidate file
enum LoadAttempt<T> {
    Loaded(T, String),
    Missing,
    Failed(String),
}

fn load_json_artifact<T: DeserializeOwned>(path: &Path) -> LoadAttempt<T> {
    if !path.exists() {
        return LoadAttempt::Missing;
    }
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return LoadAttempt::Failed(e.to_string()),
    };
    match serde_json::from_slice::<T>(&bytes) {
        Ok(value) => LoadAttempt::Loaded(value, hex::encode(Sha256::digest(&bytes))),
        Err(e) => LoadAttempt::Failed(e.to_string()),
    }
}

/// Parsed training table: rows in schema column order, optional labels
#[derive(Debug)]
struct TrainingTable {
    rows: Vec<Vec<f64>>,
    labels: Option<Vec<String>>,
}

fn parse_training_table(content: &str) -> Result<TrainingTable, String> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or_else(|| "file is empty".to_string())?;

    let column_index: HashMap<&str, usize> = header
        .split(',')
        .map(|c| c.trim())
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();

    let feature_columns: Vec<usize> = FEATURE_NAMES
        .iter()
        .map(|name| {
            column_index
                .get(*name)
                .copied()
                .ok_or_else(|| format!("missing schema column {name}"))
        })
        .collect::<Result<_, _>>()?;
    let label_column = column_index.get("Label").copied();

    let mut rows = Vec::new();
    let mut labels = label_column.map(|_| Vec::new());
    for line in lines {
        let cells: Vec<&str> = line.split(',').map(|c| c.trim()).collect();
        let parsed: Option<Vec<f64>> = feature_columns
            .iter()
            .map(|&i| cells.get(i).and_then(|c| c.parse::<f64>().ok()))
            .collect();
        // malformed rows are skipped rather than poisoning the fit
        let Some(row) = parsed else { continue };
        if let (Some(labels), Some(col)) = (labels.as_mut(), label_column) {
            let Some(value) = cells.get(col) else { continue };
            labels.push(value.to_string());
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err("no usable data rows".to_string());
    }
    Ok(TrainingTable { rows, labels })
}

/// Resolve the artifact bundle. Never fails; the worst case is a
/// simulated-mode bundle over the built-in reference classes.
pub fn resolve(config: &ResolverConfig) -> ArtifactBundle {
    let mut provenance = Vec::new();

    let mut scaler = resolve_scaler_candidates(config, &mut provenance);
    let mut labels = resolve_encoder_candidates(config, &mut provenance);

    if scaler.is_none() || labels.is_none() {
        resolve_from_training(config, &mut scaler, &mut labels, &mut provenance);
    }

    let (scaler, labels) = match (scaler, labels) {
        (Some(scaler), Some(labels)) => (scaler, labels),
        // either still unresolved: both come from the reference table
        _ => {
            let rows: Vec<Vec<f64>> = REFERENCE_ROWS.iter().map(|r| r.features.to_vec()).collect();
            let scaler = StandardScaler::fit(&rows)
                .expect("reference table is non-empty and rectangular");
            let labels = LabelEncoder::fit(REFERENCE_ROWS.iter().map(|r| r.label))
                .expect("reference table carries four labels");
            provenance.push(ProvenanceEntry::new(
                "builtin:reference-table",
                ArtifactOutcome::BuiltIn,
            ));
            info!("Preprocessing artifacts fitted from built-in reference table");
            (scaler, labels)
        }
    };

    let mode = resolve_model(config, labels.len(), &mut provenance);

    info!(
        mode = mode.name(),
        classes = ?labels.classes(),
        steps = provenance.len(),
        "Artifact resolution complete"
    );

    ArtifactBundle {
        scaler,
        labels,
        mode,
        provenance,
    }
}

fn resolve_scaler_candidates(
    config: &ResolverConfig,
    provenance: &mut Vec<ProvenanceEntry>,
) -> Option<StandardScaler> {
    for name in &config.scaler_candidates {
        let source = format!("scaler:{name}");
        match load_json_artifact::<StandardScaler>(&config.artifact_dir.join(name)) {
            LoadAttempt::Loaded(value, sha256) => {
                if value.width() != FEATURE_COUNT {
                    provenance.push(ProvenanceEntry::new(
                        source,
                        ArtifactOutcome::Failed {
                            reason: format!(
                                "fitted over {} columns, schema has {FEATURE_COUNT}",
                                value.width()
                            ),
                        },
                    ));
                    continue;
                }
                debug!(source = %name, "Scaler loaded");
                provenance.push(ProvenanceEntry::new(source, ArtifactOutcome::Loaded { sha256 }));
                return Some(value);
            }
            LoadAttempt::Missing => {
                provenance.push(ProvenanceEntry::new(source, ArtifactOutcome::Missing));
            }
            LoadAttempt::Failed(reason) => {
                warn!(source = %name, reason = %reason, "Scaler candidate unusable");
                provenance.push(ProvenanceEntry::new(source, ArtifactOutcome::Failed { reason }));
            }
        }
    }
    None
}

fn resolve_encoder_candidates(
    config: &ResolverConfig,
    provenance: &mut Vec<ProvenanceEntry>,
) -> Option<LabelEncoder> {
    for name in &config.encoder_candidates {
        let source = format!("labels:{name}");
        match load_json_artifact::<LabelEncoder>(&config.artifact_dir.join(name)) {
            LoadAttempt::Loaded(value, sha256) => {
                if value.is_empty() {
                    provenance.push(ProvenanceEntry::new(
                        source,
                        ArtifactOutcome::Failed {
                            reason: "encoder file contains no classes".to_string(),
                        },
                    ));
                    continue;
                }
                debug!(source = %name, classes = value.len(), "Label encoder loaded");
                provenance.push(ProvenanceEntry::new(source, ArtifactOutcome::Loaded { sha256 }));
                return Some(value);
            }
            LoadAttempt::Missing => {
                provenance.push(ProvenanceEntry::new(source, ArtifactOutcome::Missing));
            }
            LoadAttempt::Failed(reason) => {
                warn!(source = %name, reason = %reason, "Label encoder candidate unusable");
                provenance.push(ProvenanceEntry::new(source, ArtifactOutcome::Failed { reason }));
            }
        }
    }
    None
}

fn resolve_from_training(
    config: &ResolverConfig,
    scaler: &mut Option<StandardScaler>,
    labels: &mut Option<LabelEncoder>,
    provenance: &mut Vec<ProvenanceEntry>,
) {
    let path = config.artifact_dir.join(&config.training_file);
    let source = format!("training:{}", config.training_file);

    if !path.exists() {
        provenance.push(ProvenanceEntry::new(source, ArtifactOutcome::Missing));
        return;
    }
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            provenance.push(ProvenanceEntry::new(
                source,
                ArtifactOutcome::Failed { reason: e.to_string() },
            ));
            return;
        }
    };
    let table = match parse_training_table(&content) {
        Ok(table) => table,
        Err(reason) => {
            warn!(source = %config.training_file, reason = %reason, "Training table unusable");
            provenance.push(ProvenanceEntry::new(source, ArtifactOutcome::Failed { reason }));
            return;
        }
    };

    if scaler.is_none() {
        match StandardScaler::fit(&table.rows) {
            Ok(fitted) => {
                provenance.push(ProvenanceEntry::new(
                    format!("{source}#scaler"),
                    ArtifactOutcome::Fitted { rows: table.rows.len() },
                ));
                *scaler = Some(fitted);
            }
            Err(e) => provenance.push(ProvenanceEntry::new(
                format!("{source}#scaler"),
                ArtifactOutcome::Failed { reason: e.to_string() },
            )),
        }
    }

    if labels.is_none() {
        match &table.labels {
            Some(values) => match LabelEncoder::fit(values) {
                Ok(fitted) => {
                    provenance.push(ProvenanceEntry::new(
                        format!("{source}#labels"),
                        ArtifactOutcome::Fitted { rows: values.len() },
                    ));
                    *labels = Some(fitted);
                }
                Err(e) => provenance.push(ProvenanceEntry::new(
                    format!("{source}#labels"),
                    ArtifactOutcome::Failed { reason: e.to_string() },
                )),
            },
            None => provenance.push(ProvenanceEntry::new(
                format!("{source}#labels"),
                ArtifactOutcome::Failed {
                    reason: "no Label column".to_string(),
                },
            )),
        }
    }
}

fn resolve_model(
    config: &ResolverConfig,
    class_count: usize,
    provenance: &mut Vec<ProvenanceEntry>,
) -> EngineMode {
    let path = config.artifact_dir.join(&config.model_file);
    let source = format!("model:{}", config.model_file);

    if !path.exists() {
        provenance.push(ProvenanceEntry::new(source, ArtifactOutcome::Missing));
        return EngineMode::Simulated;
    }
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            provenance.push(ProvenanceEntry::new(
                source,
                ArtifactOutcome::Failed { reason: e.to_string() },
            ));
            return EngineMode::Simulated;
        }
    };
    match ThreatModel::from_bytes(&bytes, class_count) {
        Ok(model) => {
            info!(source = %config.model_file, classes = class_count, "Classifier weights loaded");
            provenance.push(ProvenanceEntry::new(
                source,
                ArtifactOutcome::Loaded {
                    sha256: hex::encode(Sha256::digest(&bytes)),
                },
            ));
            EngineMode::Real { model }
        }
        Err(e) => {
            warn!(source = %config.model_file, error = %e, "Classifier weights unusable, running simulated");
            provenance.push(ProvenanceEntry::new(
                source,
                ArtifactOutcome::Failed { reason: e.to_string() },
            ));
            EngineMode::Simulated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn builtin_entry(bundle: &ArtifactBundle) -> bool {
        bundle
            .provenance
            .iter()
            .any(|e| matches!(e.outcome, ArtifactOutcome::BuiltIn))
    }

    #[test]
    fn test_empty_dir_resolves_to_simulated_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = resolve(&ResolverConfig::with_dir(dir.path()));

        assert!(!bundle.mode.is_real());
        assert_eq!(
            bundle.classes(),
            ["Benign", "DDoS", "Malware", "Port_Scan"]
        );
        assert!(builtin_entry(&bundle));
        // candidates and model are all recorded as missing
        let missing = bundle
            .provenance
            .iter()
            .filter(|e| matches!(e.outcome, ArtifactOutcome::Missing))
            .count();
        assert_eq!(missing, 6);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = ResolverConfig::with_dir(dir.path());
        let first = resolve(&config);
        let second = resolve(&config);
        assert_eq!(first.mode.name(), second.mode.name());
        assert_eq!(first.classes(), second.classes());
        assert_eq!(first.provenance.len(), second.provenance.len());
    }

    #[test]
    fn test_valid_candidate_files_win() {
        let dir = tempfile::tempdir().unwrap();
        let rows: Vec<Vec<f64>> = REFERENCE_ROWS.iter().map(|r| r.features.to_vec()).collect();
        let scaler = StandardScaler::fit(&rows).unwrap();
        fs::write(
            dir.path().join("scaler.json"),
            serde_json::to_string(&scaler).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("label_encoder.json"),
            r#"{"classes":["Benign","DDoS","Recon"]}"#,
        )
        .unwrap();

        let bundle = resolve(&ResolverConfig::with_dir(dir.path()));
        assert_eq!(bundle.classes(), ["Benign", "DDoS", "Recon"]);
        assert!(!builtin_entry(&bundle));
        assert!(!bundle.mode.is_real());
        let loaded = bundle
            .provenance
            .iter()
            .filter(|e| matches!(e.outcome, ArtifactOutcome::Loaded { .. }))
            .count();
        assert_eq!(loaded, 2);
    }

    #[test]
    fn test_corrupt_candidate_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("scaler.json"), "not json").unwrap();

        let bundle = resolve(&ResolverConfig::with_dir(dir.path()));
        let failed = bundle
            .provenance
            .iter()
            .find(|e| e.source == "scaler:scaler.json")
            .unwrap();
        assert!(matches!(failed.outcome, ArtifactOutcome::Failed { .. }));
        // resolution still terminated usably
        assert!(!bundle.classes().is_empty());
    }

    #[test]
    fn test_wrong_width_scaler_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("scaler.json"),
            r#"{"mean":[0.0,0.0],"scale":[1.0,1.0]}"#,
        )
        .unwrap();

        let bundle = resolve(&ResolverConfig::with_dir(dir.path()));
        let entry = bundle
            .provenance
            .iter()
            .find(|e| e.source == "scaler:scaler.json")
            .unwrap();
        assert!(matches!(entry.outcome, ArtifactOutcome::Failed { .. }));
    }

    #[test]
    fn test_training_table_fills_missing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let header = FEATURE_NAMES.join(",") + ",Label";
        let mut csv = header + "\n";
        for row in &REFERENCE_ROWS {
            let cells: Vec<String> = row.features.iter().map(|v| v.to_string()).collect();
            csv.push_str(&format!("{},{}\n", cells.join(","), row.label));
        }
        fs::write(dir.path().join("train_features.csv"), csv).unwrap();

        let bundle = resolve(&ResolverConfig::with_dir(dir.path()));
        assert_eq!(
            bundle.classes(),
            ["Benign", "DDoS", "Malware", "Port_Scan"]
        );
        assert!(!builtin_entry(&bundle));
        let fitted = bundle
            .provenance
            .iter()
            .filter(|e| matches!(e.outcome, ArtifactOutcome::Fitted { .. }))
            .count();
        assert_eq!(fitted, 2);
    }

    #[test]
    fn test_training_table_without_labels_falls_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let header = FEATURE_NAMES.join(",");
        let mut csv = header + "\n";
        let cells: Vec<String> = REFERENCE_ROWS[0].features.iter().map(|v| v.to_string()).collect();
        csv.push_str(&(cells.join(",") + "\n"));
        fs::write(dir.path().join("train_features.csv"), csv).unwrap();

        let bundle = resolve(&ResolverConfig::with_dir(dir.path()));
        // encoder could not be derived, so the reference table supplies both
        assert!(builtin_entry(&bundle));
        assert_eq!(
            bundle.classes(),
            ["Benign", "DDoS", "Malware", "Port_Scan"]
        );
    }

    #[test]
    fn test_corrupt_model_degrades_to_simulated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("model.onnx"), b"not a model").unwrap();

        let bundle = resolve(&ResolverConfig::with_dir(dir.path()));
        assert!(!bundle.mode.is_real());
        let entry = bundle
            .provenance
            .iter()
            .find(|e| e.source == "model:model.onnx")
            .unwrap();
        assert!(matches!(entry.outcome, ArtifactOutcome::Failed { .. }));
    }

    #[test]
    fn test_parse_training_table_skips_malformed_rows() {
        let header = FEATURE_NAMES.join(",") + ",Label";
        let good: Vec<String> = REFERENCE_ROWS[0].features.iter().map(|v| v.to_string()).collect();
        let content = format!("{header}\n{},{}\nbad,row\n", good.join(","), "Benign");

        let table = parse_training_table(&content).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.labels.as_deref(), Some(&["Benign".to_string()][..]));
    }

    #[test]
    fn test_parse_training_table_requires_schema_columns() {
        let err = parse_training_table("a,b,c\n1,2,3\n").unwrap_err();
        assert!(err.contains("missing schema column"));
    }
}
