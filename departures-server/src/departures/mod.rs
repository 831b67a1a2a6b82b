//! Departures: display ordering, the load pipeline and the query API.

mod api;
mod envelope;
mod loader;
mod sort;

pub use api::{
    ApiError, DeparturesApi, INVALID_LOCATION, Outcome, StopReadError, UNKNOWN_STOP_AREA,
};
pub use envelope::{DepartureResult, DeparturesResponse, ErrorResponse, departures_response};
pub use loader::{DeparturesLoader, LoadError};
pub use sort::{display_order, sort_departures};
