//! Display ordering for departures.
//!
//! Departures are shown soonest first. Ties on wait are broken by status
//! (a departing tram before an arrived one before a due one), then by the
//! slot on the display, destination, platform and finally formation.

use std::cmp::Ordering;

use crate::domain::Departure;

/// Rank of a status within the same wait.
fn status_tier(status: &str) -> u8 {
    match status {
        "Departing" => 0,
        "Arrived" => 1,
        _ => 2,
    }
}

/// Compare two departures for display.
///
/// Platforms are compared only when both departures have one. Carriages
/// compare descending, which puts "Single" ahead of "Double".
pub fn display_order(a: &Departure, b: &Departure) -> Ordering {
    a.wait
        .display_cmp(&b.wait)
        .then_with(|| status_tier(&a.status).cmp(&status_tier(&b.status)))
        .then_with(|| a.order.cmp(&b.order))
        .then_with(|| a.destination.cmp(&b.destination))
        .then_with(|| match (&a.platform, &b.platform) {
            (Some(pa), Some(pb)) => pa.cmp(pb),
            _ => Ordering::Equal,
        })
        .then_with(|| b.carriages.cmp(&a.carriages))
}

/// Sort departures for display, keeping the input order of equal entries.
pub fn sort_departures(departures: &mut [Departure]) {
    departures.sort_by(display_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Wait;

    fn departure(wait: &str, status: &str, order: u8, destination: &str) -> Departure {
        Departure {
            atco_code: "9400ZZMASTP1".to_string(),
            order,
            destination: destination.to_string(),
            carriages: "Single".to_string(),
            status: status.to_string(),
            wait: Wait::parse(wait),
            platform: None,
            last_updated: "2021-03-21T15:34:54Z".parse().unwrap(),
        }
    }

    fn destinations(departures: &[Departure]) -> Vec<&str> {
        departures.iter().map(|d| d.destination.as_str()).collect()
    }

    #[test]
    fn waits_sort_numerically() {
        let mut ds = vec![
            departure("12", "Due", 0, "a"),
            departure("2", "Due", 0, "b"),
            departure("9", "Due", 0, "c"),
        ];
        sort_departures(&mut ds);
        assert_eq!(destinations(&ds), ["b", "c", "a"]);
    }

    #[test]
    fn sentinels_sort_last() {
        let mut ds = vec![
            departure("DELAY", "Due", 0, "a"),
            departure("20", "Due", 0, "b"),
            departure("0", "Due", 0, "c"),
        ];
        sort_departures(&mut ds);
        assert_eq!(destinations(&ds), ["c", "b", "a"]);
    }

    #[test]
    fn status_breaks_wait_ties() {
        let mut ds = vec![
            departure("0", "Due", 0, "due"),
            departure("0", "Arrived", 0, "arrived"),
            departure("0", "Departing", 0, "departing"),
        ];
        sort_departures(&mut ds);
        assert_eq!(destinations(&ds), ["departing", "arrived", "due"]);
    }

    #[test]
    fn order_then_destination() {
        let mut ds = vec![
            departure("3", "Due", 1, "Altrincham"),
            departure("3", "Due", 0, "Bury"),
            departure("3", "Due", 0, "Ashton"),
        ];
        sort_departures(&mut ds);
        assert_eq!(destinations(&ds), ["Ashton", "Bury", "Altrincham"]);
    }

    #[test]
    fn platform_only_when_both_present() {
        let mut c = departure("3", "Due", 0, "Eccles");
        c.platform = Some("C".into());
        c.atco_code = "c".into();
        let mut a = departure("3", "Due", 0, "Eccles");
        a.platform = Some("A".into());
        a.atco_code = "a".into();
        let mut ds = vec![c, a];
        sort_departures(&mut ds);
        assert_eq!(ds[0].atco_code, "a");

        // Without a platform on one side the carriages decide.
        let mut none = departure("3", "Due", 0, "Eccles");
        none.carriages = "Double".into();
        let mut lettered = departure("3", "Due", 0, "Eccles");
        lettered.platform = Some("A".into());
        lettered.carriages = "Single".into();
        let mut ds = vec![none, lettered];
        sort_departures(&mut ds);
        assert_eq!(ds[0].carriages, "Single");
    }

    #[test]
    fn single_before_double() {
        let mut double = departure("5", "Due", 0, "Bury");
        double.carriages = "Double".into();
        let single = departure("5", "Due", 0, "Bury");
        let mut ds = vec![double, single];
        sort_departures(&mut ds);
        assert_eq!(ds[0].carriages, "Single");
        assert_eq!(ds[1].carriages, "Double");
    }
}
