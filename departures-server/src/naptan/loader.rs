//! Refreshes cached stop-area membership.

use tracing::info;

use crate::store::StopsInAreaStore;

use super::StopsInAreaSource;
use super::error::NaptanError;

/// Fetches stop-area membership and stores it.
pub struct StopsInAreaLoader<F, S> {
    source: F,
    store: S,
}

impl<F: StopsInAreaSource, S: StopsInAreaStore> StopsInAreaLoader<F, S> {
    pub fn new(source: F, store: S) -> Self {
        Self { source, store }
    }

    pub async fn load(&self) -> Result<(), NaptanError> {
        let areas = self.source.fetch_stops_in_area().await?;
        let count = areas.len();
        self.store.store(areas).await?;
        info!(areas = count, "stored stops in area");
        Ok(())
    }
}
