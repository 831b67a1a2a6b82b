//! Feed client error types.

use thiserror::Error;

/// Errors from fetching the upstream departures feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Request failed (network error, timeout, etc.)
    #[error("error requesting departures data: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed answered with a non-success status.
    #[error("error response from data source: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("error decoding body as JSON: {message}")]
    Decode { message: String },

    /// The feed answered successfully but listed no displays.
    #[error("no departures data returned from data source")]
    Empty,

    #[error("invalid subscription key")]
    InvalidApiKey,
}
