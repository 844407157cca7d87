//! Network Threat Detector CLI
//!
//! A command-line tool for submitting traffic feature vectors, viewing
//! analysis results, and inspecting the engine's artifact resolution.

mod client;
mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, history, status};

/// Network Threat Detector CLI
#[derive(Parser)]
#[command(name = "ntd")]
#[command(author, version, about = "CLI for the Network Threat Detector", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via NTD_API_URL env var)
    #[arg(long, env = "NTD_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a traffic feature vector
    Analyze {
        /// Built-in sample traffic profile (benign, ddos, port_scan, malware)
        #[arg(long, short, conflicts_with = "file")]
        sample: Option<String>,

        /// JSON file with named feature values
        #[arg(long, short = 'F')]
        file: Option<PathBuf>,
    },

    /// Show the latest analysis
    Latest,

    /// Show the analysis history
    History {
        /// Show only the most recent N entries
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show engine mode, class set and artifact provenance
    Status,

    /// Re-run artifact resolution on the service
    Reload,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize client
    let client = client::ApiClient::new(&cli.api_url)?;

    // Execute command
    match cli.command {
        Commands::Analyze { sample, file } => {
            analyze::run(&client, sample, file, cli.format).await?;
        }
        Commands::Latest => {
            history::show_latest(&client, cli.format).await?;
        }
        Commands::History { limit } => {
            history::show_history(&client, limit, cli.format).await?;
        }
        Commands::Status => {
            status::show_status(&client, cli.format).await?;
        }
        Commands::Reload => {
            status::reload(&client, cli.format).await?;
        }
    }

    Ok(())
}
