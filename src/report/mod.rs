//! Report rendering.
//!
//! Turns an aggregated [`Report`] into the requested output format.

pub mod generator;
pub mod html;

pub use generator::{generate_json_report, generate_markdown_report};
pub use html::{generate_html_report, HtmlOptions};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::{DeptmapError, DeptmapResult};
use crate::layout;
use crate::models::Report;
use std::path::Path;
use tracing::debug;

/// Render the report in the configured format.
pub fn render(report: &Report, config: &Config) -> DeptmapResult<String> {
    match config.report.format {
        OutputFormat::Json => generate_json_report(&report.hierarchy),
        OutputFormat::Markdown => Ok(generate_markdown_report(report)),
        OutputFormat::Html => {
            let nodes = layout::layout(&report.hierarchy, &config.layout_options());
            debug!(
                "Laid out {} treemap nodes with root weight {}",
                nodes.len(),
                nodes.first().map(|n| n.value).unwrap_or_default()
            );

            let options = HtmlOptions {
                width: config.layout.width,
                height: config.layout.height,
                min_label_width: config.layout.min_label_width,
                min_label_height: config.layout.min_label_height,
            };
            Ok(generate_html_report(report, &nodes, &options))
        }
    }
}

/// Write rendered output to a file.
pub fn write_output(path: &Path, content: &str) -> DeptmapResult<()> {
    std::fs::write(path, content).map_err(|e| {
        DeptmapError::Render(format!("failed to write {}: {}", path.display(), e))
    })
}
