//! Domain types for the tram departures service.
//!
//! Validated location codes, canonical departure entries and the time
//! helpers shared by the loader and the API.

mod departure;
mod event;
mod location;
mod time;

pub use departure::{Departure, DepartureSnapshot, Wait};
pub use event::Event;
pub use location::{InvalidLocationCode, LocationCode};
pub use time::{Clock, correct_uk_local_time, fixed_clock, system_clock};
