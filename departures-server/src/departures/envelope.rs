//! JSON response bodies of the departures API.

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::{Departure, Wait};

/// Departures for a requested stop or stop area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeparturesResponse {
    pub requested_location: String,
    pub departures: Vec<DepartureResult>,
    pub last_updated: DateTime<FixedOffset>,
}

/// One departure as presented to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureResult {
    pub atco_code: String,
    /// Position in the sorted output.
    pub sequence: usize,
    pub destination: String,
    pub status: String,
    pub wait: Wait,
    pub carriages: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub last_updated: DateTime<FixedOffset>,
}

/// A request that could not be answered with departures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub requested_location: String,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(requested_location: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            requested_location: requested_location.into(),
            error: error.into(),
        }
    }
}

/// Build the success body from already sorted departures.
pub fn departures_response(
    requested_location: &str,
    departures: Vec<Departure>,
    last_updated: DateTime<Utc>,
    time_zone: Tz,
) -> DeparturesResponse {
    let local = |at: DateTime<Utc>| at.with_timezone(&time_zone).fixed_offset();

    let departures = departures
        .into_iter()
        .enumerate()
        .map(|(sequence, d)| DepartureResult {
            atco_code: d.atco_code,
            sequence,
            destination: d.destination,
            status: d.status,
            wait: d.wait,
            carriages: d.carriages,
            platform: d.platform,
            last_updated: local(d.last_updated),
        })
        .collect();

    DeparturesResponse {
        requested_location: requested_location.to_string(),
        departures,
        last_updated: local(last_updated),
    }
}
