//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Deptmap - department enrollment treemaps from spreadsheets
///
/// Reads the first sheet of an enrollment spreadsheet, totals students per
/// department and section, and writes a treemap (HTML), the aggregated
/// hierarchy (JSON), or a summary (Markdown).
///
/// Examples:
///   deptmap CSE_Enrollment.xlsx
///   deptmap https://example.org/CSE_Enrollment.xlsx -o treemap.html
///   deptmap CSE_Enrollment.xlsx --format json -o hierarchy.json
///   deptmap --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Spreadsheet URL or path
    ///
    /// HTTP(S) URLs are downloaded; anything else is read from disk.
    /// Defaults to the config file's `source.location`.
    #[arg(value_name = "SOURCE", env = "DEPTMAP_SOURCE")]
    pub source: Option<String>,

    /// Output file path
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (html, json, markdown)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .deptmap.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Treemap canvas width in pixels
    #[arg(long, value_name = "PX")]
    pub width: Option<f64>,

    /// Treemap canvas height in pixels
    #[arg(long, value_name = "PX")]
    pub height: Option<f64>,

    /// Heading for the HTML and Markdown outputs
    #[arg(long)]
    pub title: Option<String>,

    /// Fetch timeout in seconds
    ///
    /// By default the fetch waits indefinitely.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .deptmap.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Standalone HTML page with an SVG treemap (default)
    #[default]
    Html,
    /// Aggregated hierarchy as JSON
    Json,
    /// Markdown summary
    Markdown,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Only HTTP(S) URLs can be fetched
        if let Some(ref source) = self.source {
            if let Some((scheme, _)) = source.split_once("://") {
                if scheme != "http" && scheme != "https" {
                    return Err(format!(
                        "Unsupported URL scheme '{}': source URLs must start with 'http://' or 'https://'",
                        scheme
                    ));
                }
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        for (flag, value) in [("--width", self.width), ("--height", self.height)] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(format!("{} must be a positive number", flag));
                }
            }
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
