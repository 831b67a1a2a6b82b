//! Canonical departure entries.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minutes until departure, as shown on a passenger information display.
///
/// Displays usually show a whole number of minutes, but may show a word such
/// as `DELAY` instead. The display text is kept verbatim and served back
/// unchanged; the parsed minutes only drive ordering.
///
/// # Examples
///
/// ```
/// use departures_server::domain::Wait;
///
/// assert_eq!(Wait::parse("7").minutes(), Some(7));
/// assert_eq!(Wait::parse("05").as_str(), "05");
/// assert!(Wait::parse("DELAY").is_sentinel());
/// assert!(Wait::parse("12").display_cmp(&Wait::parse("DELAY")).is_lt());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Wait {
    text: String,
    minutes: Option<i64>,
}

impl Wait {
    /// Interpret display text as a wait value.
    pub fn parse(s: &str) -> Self {
        Self::from(s.to_string())
    }

    /// A numeric wait rendered without padding.
    pub fn from_minutes(minutes: i64) -> Self {
        Self {
            text: minutes.to_string(),
            minutes: Some(minutes),
        }
    }

    /// Compare two waits for display ordering.
    ///
    /// Numbers ascend, every sentinel sorts after every number and two
    /// sentinels tie whatever their text. This is coarser than `Eq`, so it is
    /// a method rather than an `Ord` impl.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        match (self.minutes, other.minutes) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Returns the number of minutes, if numeric.
    pub fn minutes(&self) -> Option<i64> {
        self.minutes
    }

    /// True when the display shows text rather than a number.
    pub fn is_sentinel(&self) -> bool {
        self.minutes.is_none()
    }

    /// The display text as received.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<String> for Wait {
    fn from(text: String) -> Self {
        let minutes = text.parse::<i64>().ok();
        Self { text, minutes }
    }
}

impl From<Wait> for String {
    fn from(wait: Wait) -> Self {
        wait.text
    }
}

impl fmt::Display for Wait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A single live departure shown on one slot of a stop's display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Departure {
    /// ATCO code of the stop (platform) the tram departs from.
    pub atco_code: String,

    /// Slot index on the physical display, 0-3.
    pub order: u8,

    /// Destination text as displayed.
    pub destination: String,

    /// Formation: "Single" or "Double".
    pub carriages: String,

    /// "Due", "Arrived" or "Departing".
    pub status: String,

    /// Minutes until departure.
    pub wait: Wait,

    /// Platform letter, where the stop has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// When the display last reported, in UTC.
    pub last_updated: DateTime<Utc>,
}

/// The result of one upstream fetch: normalised departures plus the newest
/// timestamp any display reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureSnapshot {
    pub departures: Vec<Departure>,
    pub last_updated: DateTime<Utc>,
}
