//! Submit a feature vector for classification

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use detector_lib::artifacts::reference_row;
use detector_lib::schema::FEATURE_NAMES;
use tabled::Tabled;

use crate::client::{ApiClient, ClassifyRequest, ThreatAnalysis};
use crate::output::{color_confidence, color_risk, format_timestamp, OutputFormat};

/// Row for the class-probability table
#[derive(Tabled)]
struct ProbabilityRow {
    #[tabled(rename = "Threat Class")]
    class: String,
    #[tabled(rename = "Probability")]
    probability: String,
}

/// Classify a built-in sample profile or a named-feature JSON file
pub async fn run(
    client: &ApiClient,
    sample: Option<String>,
    file: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let features = load_features(sample, file)?;

    let analysis: ThreatAnalysis = client
        .post("api/classify", &ClassifyRequest { features })
        .await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        OutputFormat::Table => render_analysis(&analysis),
    }

    Ok(())
}

fn load_features(
    sample: Option<String>,
    file: Option<PathBuf>,
) -> Result<HashMap<String, f64>> {
    if let Some(name) = sample {
        let row = reference_row(&name).with_context(|| {
            format!("unknown sample '{name}', available: benign, ddos, port_scan, malware")
        })?;
        return Ok(FEATURE_NAMES
            .iter()
            .zip(row.features.iter())
            .map(|(feature, value)| (feature.to_string(), *value))
            .collect());
    }
    if let Some(path) = file {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("{} is not a named-feature JSON object", path.display()));
    }
    anyhow::bail!("provide --sample or --file");
}

/// Render one analysis as a result card
pub fn render_analysis(analysis: &ThreatAnalysis) {
    let benign = {
        let class = analysis.threat_class.to_lowercase();
        class.contains("benign") || class.contains("normal")
    };

    if benign {
        println!("{}", "BENIGN TRAFFIC".green().bold());
    } else {
        println!(
            "{} {}",
            "THREAT DETECTED:".red().bold(),
            analysis.threat_class.red().bold()
        );
    }
    println!("Time:       {}", format_timestamp(&analysis.timestamp));
    println!("Confidence: {}", color_confidence(analysis.confidence));
    println!("Risk level: {}", color_risk(&analysis.risk_level));
    if analysis.mode == "simulated" {
        println!(
            "Mode:       {} (no trained model loaded)",
            "simulated".yellow()
        );
    } else if !analysis.mode.is_empty() {
        println!("Mode:       {}", analysis.mode);
    }

    // probabilities, most likely first
    let mut entries: Vec<(&String, &f64)> = analysis.probabilities.iter().collect();
    entries.sort_by(|(_, a), (_, b)| b.total_cmp(a));
    let rows: Vec<ProbabilityRow> = entries
        .into_iter()
        .map(|(class, probability)| ProbabilityRow {
            class: class.clone(),
            probability: format!("{:.1}%", probability * 100.0),
        })
        .collect();
    if !rows.is_empty() {
        let table = tabled::Table::new(rows)
            .with(tabled::settings::Style::rounded())
            .to_string();
        println!("{}", table);
    }

    if !analysis.recommendations.is_empty() {
        println!("Recommendations:");
        for recommendation in &analysis.recommendations {
            println!("  - {}", recommendation);
        }
    }
}
