//! Spreadsheet retrieval.
//!
//! Fetches the raw workbook bytes either over HTTP(S) with reqwest or from
//! the local filesystem. Exactly one suspending read per run; no retries.

use crate::error::{DeptmapError, DeptmapResult};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Where the spreadsheet lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// An `http://` or `https://` URL.
    Remote(String),
    /// A path on the local filesystem.
    Local(PathBuf),
}

impl SourceLocation {
    /// Classify a location string. Anything that is not an HTTP(S) URL is a path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            SourceLocation::Remote(location.to_string())
        } else {
            SourceLocation::Local(PathBuf::from(location))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceLocation::Remote(_))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Remote(url) => write!(f, "{}", url),
            SourceLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Options for fetching the spreadsheet.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Request timeout (None waits indefinitely).
    pub timeout: Option<Duration>,
    /// Whether to show a spinner while fetching.
    pub show_progress: bool,
}

/// Fetch the raw spreadsheet bytes.
pub async fn fetch_spreadsheet(
    location: &SourceLocation,
    options: &FetchOptions,
) -> DeptmapResult<Vec<u8>> {
    info!("Fetching spreadsheet: {}", location);

    let spinner = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Fetching {}", location));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = match location {
        SourceLocation::Remote(url) => fetch_remote(url, options.timeout).await,
        SourceLocation::Local(path) => fetch_local(path).await,
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let bytes = result?;
    info!("Fetched {} bytes from {}", bytes.len(), location);
    Ok(bytes)
}

async fn fetch_remote(url: &str, timeout: Option<Duration>) -> DeptmapResult<Vec<u8>> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder
        .build()
        .map_err(|e| DeptmapError::source_unavailable(url, e))?;

    let response = client.get(url).send().await.map_err(|e| {
        let reason = if e.is_timeout() {
            format!(
                "request timed out after {}s",
                timeout.map(|t| t.as_secs()).unwrap_or_default()
            )
        } else if e.is_connect() {
            format!("cannot connect: {}", e)
        } else {
            format!("failed to send request: {}", e)
        };
        DeptmapError::source_unavailable(url, reason)
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DeptmapError::source_unavailable(
            url,
            format!("HTTP status {}", status),
        ));
    }

    debug!("Response status {} from {}", status, url);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DeptmapError::source_unavailable(url, format!("failed to read body: {}", e)))?;

    Ok(bytes.to_vec())
}

async fn fetch_local(path: &Path) -> DeptmapResult<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| DeptmapError::source_unavailable(path.display().to_string(), e))
}
