//! Upstream feed response DTOs.
//!
//! These map directly to the Metrolink open data JSON. Every display unit
//! carries four fixed departure slots; unused slots are empty strings.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The top-level response: an OData collection of displays.
#[derive(Debug, Clone, Deserialize)]
pub struct MetrolinksResponse {
    #[serde(rename = "value", default)]
    pub displays: Vec<PassengerInformationDisplay>,
}

/// One physical passenger information display.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PassengerInformationDisplay {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Line")]
    pub line: String,
    /// Three-letter stop reference.
    #[serde(rename = "TLAREF")]
    pub tla_ref: String,
    /// Display reference, e.g. "SPS-PID05".
    #[serde(rename = "PIDREF")]
    pub pid_ref: String,
    #[serde(rename = "StationLocation")]
    pub station_location: String,
    /// NaPTAN code of the platform the display serves.
    #[serde(rename = "AtcoCode")]
    pub atco_code: String,
    #[serde(rename = "Direction")]
    pub direction: String,

    #[serde(rename = "Dest0")]
    pub dest0: String,
    #[serde(rename = "Carriages0")]
    pub carriages0: String,
    #[serde(rename = "Status0")]
    pub status0: String,
    #[serde(rename = "Wait0")]
    pub wait0: String,

    #[serde(rename = "Dest1")]
    pub dest1: String,
    #[serde(rename = "Carriages1")]
    pub carriages1: String,
    #[serde(rename = "Status1")]
    pub status1: String,
    #[serde(rename = "Wait1")]
    pub wait1: String,

    #[serde(rename = "Dest2")]
    pub dest2: String,
    #[serde(rename = "Carriages2")]
    pub carriages2: String,
    #[serde(rename = "Status2")]
    pub status2: String,
    #[serde(rename = "Wait2")]
    pub wait2: String,

    #[serde(rename = "Dest3")]
    pub dest3: String,
    #[serde(rename = "Carriages3")]
    pub carriages3: String,
    #[serde(rename = "Status3")]
    pub status3: String,
    #[serde(rename = "Wait3")]
    pub wait3: String,

    #[serde(rename = "MessageBoard")]
    pub message_board: String,

    /// Nominally UTC, but frequently UK local time with a "Z" suffix.
    #[serde(rename = "LastUpdated")]
    pub last_updated: DateTime<Utc>,
}

/// A borrowed view of one departure slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot<'a> {
    pub destination: &'a str,
    pub carriages: &'a str,
    pub status: &'a str,
    pub wait: &'a str,
}

impl PassengerInformationDisplay {
    /// The four departure slots in display order.
    pub fn slots(&self) -> [Slot<'_>; 4] {
        [
            Slot {
                destination: &self.dest0,
                carriages: &self.carriages0,
                status: &self.status0,
                wait: &self.wait0,
            },
            Slot {
                destination: &self.dest1,
                carriages: &self.carriages1,
                status: &self.status1,
                wait: &self.wait1,
            },
            Slot {
                destination: &self.dest2,
                carriages: &self.carriages2,
                status: &self.status2,
                wait: &self.wait2,
            },
            Slot {
                destination: &self.dest3,
                carriages: &self.carriages3,
                status: &self.status3,
                wait: &self.wait3,
            },
        ]
    }
}
