//! Latest-analysis and history commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, HistoryEnvelope, LatestEnvelope};
use crate::commands::analyze::render_analysis;
use crate::output::{
    color_confidence, color_risk, format_timestamp, print_info, OutputFormat,
};

/// Row for the history table
#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Threat Class")]
    threat_class: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Mode")]
    mode: String,
}

/// Show the most recent analysis
pub async fn show_latest(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let envelope: LatestEnvelope = client.get("api/threat-analysis").await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&envelope.data)?);
        }
        OutputFormat::Table => match &envelope.data {
            Some(analysis) => render_analysis(analysis),
            None => print_info("No analysis data available"),
        },
    }

    Ok(())
}

/// Show the rolling analysis history
pub async fn show_history(
    client: &ApiClient,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let envelope: HistoryEnvelope = client.get("api/threat-analysis/history").await?;

    // history arrives oldest first; a limit keeps the newest entries
    let entries = match limit {
        Some(n) if n < envelope.data.len() => &envelope.data[envelope.data.len() - n..],
        _ => &envelope.data[..],
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(entries)?);
        }
        OutputFormat::Table => {
            if entries.is_empty() {
                print_info("No analysis data available");
                return Ok(());
            }

            let rows: Vec<HistoryRow> = entries
                .iter()
                .map(|analysis| HistoryRow {
                    time: format_timestamp(&analysis.timestamp),
                    id: analysis.id.clone(),
                    threat_class: analysis.threat_class.clone(),
                    confidence: color_confidence(analysis.confidence),
                    risk: color_risk(&analysis.risk_level),
                    mode: analysis.mode.clone(),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nShowing {} of {} analyses", entries.len(), envelope.count);
        }
    }

    Ok(())
}
