//! Scheduled load events.

use chrono::{DateTime, Utc};

/// A request to run a data load at `start_time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub start_time: DateTime<Utc>,
    pub payload: String,
}

impl Event {
    pub fn new(start_time: DateTime<Utc>, payload: impl Into<String>) -> Self {
        Self {
            start_time,
            payload: payload.into(),
        }
    }
}
