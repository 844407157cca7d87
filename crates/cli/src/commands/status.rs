//! Engine status and artifact reload commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, EngineStatus, ReloadResponse};
use crate::output::{color_mode, print_success, print_warning, OutputFormat};

/// Row for the provenance table
#[derive(Tabled)]
struct ProvenanceRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

/// Show engine mode, class set and the artifact provenance trail
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let status: EngineStatus = client.get("api/engine").await?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "mode": status.mode,
                    "classes": status.classes,
                    "noise_scale": status.noise_scale,
                }))?
            );
        }
        OutputFormat::Table => {
            println!("Mode:        {}", color_mode(&status.mode));
            println!("Classes:     {}", status.classes.join(", "));
            println!("Noise scale: {}", status.noise_scale);
            if status.mode == "simulated" {
                print_warning("No trained model loaded; predictions are simulated");
            }

            let rows: Vec<ProvenanceRow> = status
                .provenance
                .iter()
                .map(|entry| ProvenanceRow {
                    source: entry.source.clone(),
                    outcome: entry.outcome.clone(),
                    detail: entry
                        .reason
                        .clone()
                        .or_else(|| entry.sha256.as_ref().map(|s| truncate_digest(s)))
                        .or_else(|| entry.rows.map(|r| format!("{r} rows")))
                        .unwrap_or_default(),
                })
                .collect();

            if !rows.is_empty() {
                println!("\nArtifact resolution:");
                let table = tabled::Table::new(rows)
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                println!("{}", table);
            }
        }
    }

    Ok(())
}

/// Ask the service to re-run artifact resolution
pub async fn reload(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: ReloadResponse = client
        .post("api/reload", &serde_json::json!({}))
        .await?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "status": response.status,
                    "mode": response.mode,
                    "classes": response.classes,
                    "steps": response.steps,
                }))?
            );
        }
        OutputFormat::Table => {
            print_success(&format!(
                "Artifacts re-resolved in {} mode ({} classes, {} steps)",
                response.mode,
                response.classes.len(),
                response.steps
            ));
        }
    }

    Ok(())
}

fn truncate_digest(digest: &str) -> String {
    if digest.len() > 12 {
        format!("sha256:{}…", &digest[..12])
    } else {
        format!("sha256:{digest}")
    }
}
