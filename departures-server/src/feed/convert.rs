//! Conversion from feed displays to domain departures.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::{Departure, DepartureSnapshot, Wait, correct_uk_local_time};

use super::types::PassengerInformationDisplay;

/// Normalise a feed response into departures.
///
/// Every display's timestamp is corrected first. The snapshot's
/// `last_updated` is the latest corrected timestamp across all displays,
/// including those later dropped as duplicates. Only the first display
/// seen for each stop contributes departures, one per slot whose status
/// is not empty.
pub fn normalize(mut displays: Vec<PassengerInformationDisplay>) -> DepartureSnapshot {
    for display in &mut displays {
        display.last_updated = correct_uk_local_time(display.last_updated);
    }

    let last_updated = displays
        .iter()
        .map(|d| d.last_updated)
        .max()
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let departures = dedup_by_stop(displays)
        .iter()
        .flat_map(departures_from_display)
        .collect();

    DepartureSnapshot {
        departures,
        last_updated,
    }
}

/// Keep the first display reporting each stop, in feed order.
fn dedup_by_stop(displays: Vec<PassengerInformationDisplay>) -> Vec<PassengerInformationDisplay> {
    let mut seen = HashSet::new();
    displays
        .into_iter()
        .filter(|d| seen.insert(d.atco_code.clone()))
        .collect()
}

fn departures_from_display(display: &PassengerInformationDisplay) -> Vec<Departure> {
    display
        .slots()
        .iter()
        .zip(0u8..)
        .filter(|(slot, _)| !slot.status.is_empty())
        .map(|(slot, order)| Departure {
            atco_code: display.atco_code.clone(),
            order,
            destination: slot.destination.to_string(),
            carriages: slot.carriages.to_string(),
            status: slot.status.to_string(),
            wait: Wait::parse(slot.wait),
            platform: None,
            last_updated: display.last_updated,
        })
        .collect()
}
