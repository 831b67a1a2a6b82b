//! Scheduler error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::ErrorList;

/// Errors from scheduling load events.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("frequency must be greater than 0")]
    NonPositiveFrequency,

    #[error(
        "event start time {start_time} is too far in the future ({delay_secs} seconds); \
         events can only be delayed by up to {max_delay_secs} seconds"
    )]
    TooFarInFuture {
        start_time: DateTime<Utc>,
        delay_secs: i64,
        max_delay_secs: i64,
    },

    /// The queue rejected a whole batch.
    #[error("error sending batch to queue: {message}")]
    Queue { message: String },

    /// The queue accepted the batch but refused some messages.
    #[error("error enqueuing {count} message(s)")]
    Enqueue { count: usize },

    #[error("{0}")]
    Multiple(ErrorList<ScheduleError>),
}
