//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.deptmap.toml` files.

use crate::cli::OutputFormat;
use crate::layout::LayoutOptions;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".deptmap.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Spreadsheet source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Treemap layout settings.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where to read the spreadsheet from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL or local path of the spreadsheet.
    #[serde(default = "default_location")]
    pub location: String,

    /// Fetch timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            timeout_seconds: None,
        }
    }
}

fn default_location() -> String {
    "CSE_Enrollment.xlsx".to_string()
}

/// Treemap geometry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_width")]
    pub width: f64,

    #[serde(default = "default_height")]
    pub height: f64,

    /// Padding inside every department and around the root.
    #[serde(default = "default_padding_outer")]
    pub padding_outer: f64,

    /// Gap between sibling rectangles.
    #[serde(default = "default_padding_inner")]
    pub padding_inner: f64,

    /// Labels are hidden on rectangles narrower than this.
    #[serde(default = "default_min_label_width")]
    pub min_label_width: f64,

    /// Labels are hidden on rectangles shorter than this.
    #[serde(default = "default_min_label_height")]
    pub min_label_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            padding_outer: default_padding_outer(),
            padding_inner: default_padding_inner(),
            min_label_width: default_min_label_width(),
            min_label_height: default_min_label_height(),
        }
    }
}

fn default_width() -> f64 {
    1900.0
}

fn default_height() -> f64 {
    800.0
}

fn default_padding_outer() -> f64 {
    25.0
}

fn default_padding_inner() -> f64 {
    5.0
}

fn default_min_label_width() -> f64 {
    50.0
}

fn default_min_label_height() -> f64 {
    20.0
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Heading for HTML and Markdown output.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            title: default_title(),
        }
    }
}

fn default_output() -> String {
    "treemap.html".to_string()
}

fn default_title() -> String {
    "Department Enrollment".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only where they were given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref source) = args.source {
            self.source.location = source.clone();
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = Some(timeout);
        }

        if let Some(width) = args.width {
            self.layout.width = width;
        }
        if let Some(height) = args.height {
            self.layout.height = height;
        }

        if let Some(ref output) = args.output {
            self.report.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref title) = args.title {
            self.report.title = title.clone();
        }
    }

    /// Check the merged settings before they reach the layout.
    ///
    /// File values never pass through the CLI checks, so both are checked here.
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;

        for (key, value) in [("layout.width", layout.width), ("layout.height", layout.height)] {
            if !value.is_finite() || value <= 0.0 {
                bail!("{} must be a positive number, got {}", key, value);
            }
        }

        for (key, value) in [
            ("layout.padding_outer", layout.padding_outer),
            ("layout.padding_inner", layout.padding_inner),
            ("layout.min_label_width", layout.min_label_width),
            ("layout.min_label_height", layout.min_label_height),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("{} must be zero or a positive number, got {}", key, value);
            }
        }

        if self.source.timeout_seconds == Some(0) {
            bail!("source.timeout_seconds must be at least 1");
        }

        Ok(())
    }

    /// Geometry for the treemap layout.
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            width: self.layout.width,
            height: self.layout.height,
            padding_outer: self.layout.padding_outer,
            padding_inner: self.layout.padding_inner,
        }
    }

    /// Fetch timeout, if one is configured.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.source.timeout_seconds.map(Duration::from_secs)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
