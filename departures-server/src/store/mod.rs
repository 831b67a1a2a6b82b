//! The cache store: wire contract, in-process backend and repositories.

mod codec;
mod connection;
mod departures;
mod error;
mod memory;
mod pipeline;
mod status;
mod stops_in_area;

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};

pub use codec::{Codec, JsonCodec};
pub use connection::{Command, Connection, Pool, Reply};
pub use departures::DepartureRepository;
pub use error::StoreError;
pub use memory::{MemoryConnection, MemoryPool, MemoryStore, StoreConfig};
pub use status::SystemStatusRepository;
pub use stops_in_area::StopsInAreaRepository;

use crate::domain::Departure;

/// Cached departure groups keyed by stop.
pub trait DepartureStore: Send + Sync {
    /// Departures cached for one stop; `NotFound` when none are.
    fn get(
        &self,
        atco_code: &str,
    ) -> impl Future<Output = Result<Vec<Departure>, StoreError>> + Send;

    /// Replace the cached group of every stop present in `departures`.
    fn store(
        &self,
        departures: Vec<Departure>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The feed's last-updated time.
pub trait SystemStatusStore: Send + Sync {
    fn get_last_updated(&self) -> impl Future<Output = Result<DateTime<Utc>, StoreError>> + Send;

    fn set_last_updated(
        &self,
        last_updated: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Stop-area membership.
pub trait StopsInAreaStore: Send + Sync {
    fn get(&self, area_code: &str) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    fn store(
        &self,
        areas: HashMap<String, Vec<String>>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
