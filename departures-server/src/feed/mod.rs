//! Live departures feed.
//!
//! Fetches the Metrolink open data feed and normalises its per-display
//! records into one [`Departure`](crate::domain::Departure) per live slot.
//!
//! Quirks of the feed handled here:
//! - Several physical displays can report the same stop; only the first is
//!   used.
//! - `LastUpdated` is UK local time labelled as UTC, so it runs an hour
//!   fast during British Summer Time.

mod client;
mod convert;
mod error;
mod types;

use std::future::Future;

pub use client::{FeedClient, FeedConfig};
pub use convert::normalize;
pub use error::FeedError;
pub use types::{MetrolinksResponse, PassengerInformationDisplay, Slot};

use crate::domain::DepartureSnapshot;

/// Anything that can produce a normalised departures snapshot.
pub trait DepartureSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<DepartureSnapshot, FeedError>> + Send;
}
