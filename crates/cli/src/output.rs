//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format confidence as percentage
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Color confidence based on value
pub fn color_confidence(confidence: f64) -> String {
    let formatted = format_confidence(confidence);
    if confidence >= 0.8 {
        formatted.green().to_string()
    } else if confidence >= 0.6 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color a risk level by severity
pub fn color_risk(risk_level: &str) -> String {
    match risk_level.to_lowercase().as_str() {
        "low" => risk_level.green().to_string(),
        "medium" => risk_level.yellow().to_string(),
        "high" => risk_level.red().to_string(),
        "critical" => risk_level.red().bold().to_string(),
        _ => risk_level.to_string(),
    }
}

/// Color an engine mode
pub fn color_mode(mode: &str) -> String {
    match mode {
        "real" => mode.green().to_string(),
        "simulated" => mode.yellow().to_string(),
        _ => mode.to_string(),
    }
}

/// Format timestamp for display
pub fn format_timestamp(ts: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(ts) {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(0.873), "87.3%");
        assert_eq!(format_confidence(1.0), "100.0%");
    }

    #[test]
    fn test_format_timestamp_falls_back_to_raw() {
        assert_eq!(format_timestamp("not-a-time"), "not-a-time");
        assert_eq!(
            format_timestamp("2026-01-02T03:04:05Z"),
            "2026-01-02 03:04:05"
        );
    }
}
