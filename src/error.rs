//! Error taxonomy for the load-and-render pipeline.
//!
//! Malformed rows are never an error: they are absorbed by the aggregator.
//! Only an unreadable source or a failed write aborts the run.

use thiserror::Error;

pub type DeptmapResult<T> = Result<T, DeptmapError>;

#[derive(Error, Debug)]
pub enum DeptmapError {
    /// The spreadsheet could not be retrieved or decoded.
    #[error("Source unavailable ({location}): {reason}")]
    SourceUnavailable { location: String, reason: String },

    /// The output could not be produced or written.
    #[error("Render error: {0}")]
    Render(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeptmapError {
    pub fn source_unavailable(location: impl Into<String>, reason: impl ToString) -> Self {
        DeptmapError::SourceUnavailable {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means no hierarchy could be built at all.
    pub fn is_source_error(&self) -> bool {
        matches!(self, DeptmapError::SourceUnavailable { .. })
    }
}
