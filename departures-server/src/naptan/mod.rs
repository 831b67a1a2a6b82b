//! Stop-area membership from the NaPTAN dataset.
//!
//! NaPTAN publishes a zipped CSV export; `StopsInArea.csv` lists one row per
//! (stop area, member stop) pair.

mod client;
mod error;
mod loader;

use std::collections::HashMap;
use std::future::Future;

pub use client::{NaptanClient, NaptanConfig, parse_stops_in_area};
pub use error::NaptanError;
pub use loader::StopsInAreaLoader;

/// Anything that can list the member stops of every stop area.
pub trait StopsInAreaSource: Send + Sync {
    fn fetch_stops_in_area(
        &self,
    ) -> impl Future<Output = Result<HashMap<String, Vec<String>>, NaptanError>> + Send;
}
