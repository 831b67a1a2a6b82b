//! NaPTAN loader error types.

use thiserror::Error;

use crate::store::StoreError;

/// Errors from downloading, parsing or storing stop-area membership.
#[derive(Debug, Error)]
pub enum NaptanError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("error response from {url}: {status} {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("error reading zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("file '{filename}' not found in zip archive")]
    MissingFile { filename: String },

    #[error("error reading CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A row lacks one of the configured columns.
    #[error("row {line} has {columns} columns, expected at least {needed}")]
    ShortRow {
        line: u64,
        columns: usize,
        needed: usize,
    },

    #[error("archive parsing task failed: {0}")]
    Task(String),

    #[error("error storing stops in area: {0}")]
    Store(#[from] StoreError),
}
