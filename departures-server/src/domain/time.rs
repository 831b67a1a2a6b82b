//! Time handling for upstream display timestamps.
//!
//! The upstream feed stamps each display with a `LastUpdated` value ending in
//! `Z`, but the wall-clock part is UK local time. During British Summer Time
//! that puts the timestamp one hour in the future. `correct_uk_local_time`
//! detects and undoes this without hard-coding any DST date ranges.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Europe::London;

/// Source of the current time, injectable for tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The wall clock.
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// A clock frozen at `at`.
pub fn fixed_clock(at: DateTime<Utc>) -> Clock {
    Arc::new(move || at)
}

/// Correct a timestamp whose UK local wall-clock value was tagged as UTC.
///
/// The wall-clock fields are reinterpreted as Europe/London local time. If
/// that names the same instant, London was on GMT and the value is returned
/// unchanged. Otherwise London was ahead of UTC and one hour is subtracted.
/// Wall-clock values that do not exist in London (the spring-forward gap)
/// are returned unchanged. Values that occur twice (the fall-back hour) are
/// read as GMT, so they are also returned unchanged.
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, Utc};
/// use departures_server::domain::correct_uk_local_time;
///
/// // Winter: GMT, no correction.
/// let winter: DateTime<Utc> = "2021-01-15T10:00:00Z".parse().unwrap();
/// assert_eq!(correct_uk_local_time(winter), winter);
///
/// // Summer: BST, the feed is an hour ahead.
/// let summer: DateTime<Utc> = "2021-04-24T15:04:05Z".parse().unwrap();
/// let fixed: DateTime<Utc> = "2021-04-24T14:04:05Z".parse().unwrap();
/// assert_eq!(correct_uk_local_time(summer), fixed);
/// ```
pub fn correct_uk_local_time(reported: DateTime<Utc>) -> DateTime<Utc> {
    let wall_clock = reported.naive_utc();

    let Some(as_london) = London.from_local_datetime(&wall_clock).latest() else {
        return reported;
    };

    if as_london.with_timezone(&Utc) == reported {
        reported
    } else {
        reported - Duration::hours(1)
    }
}
