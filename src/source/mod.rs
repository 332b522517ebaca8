//! Spreadsheet source handling.

pub mod fetcher;

pub use fetcher::{fetch_spreadsheet, FetchOptions, SourceLocation};
