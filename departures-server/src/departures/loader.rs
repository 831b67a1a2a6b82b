//! Feed-to-cache load pipeline.

use chrono::TimeDelta;
use thiserror::Error;
use tracing::{error, info};

use crate::domain::{Clock, Departure};
use crate::feed::{DepartureSource, FeedError};
use crate::platforms::PlatformNamer;
use crate::store::{DepartureStore, StoreError, SystemStatusStore};

/// Errors from one load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("error setting Metrolink departures system status: {0}")]
    Status(#[source] StoreError),

    #[error(transparent)]
    Store(StoreError),
}

/// Fetches the feed, records its freshness and caches the fresh departures.
pub struct DeparturesLoader<S, N, D, T> {
    source: S,
    platforms: N,
    departures: D,
    status: T,
    clock: Clock,
    stale_threshold: TimeDelta,
}

impl<S, N, D, T> DeparturesLoader<S, N, D, T>
where
    S: DepartureSource,
    N: PlatformNamer,
    D: DepartureStore,
    T: SystemStatusStore,
{
    pub fn new(
        source: S,
        platforms: N,
        departures: D,
        status: T,
        clock: Clock,
        stale_threshold: TimeDelta,
    ) -> Self {
        Self {
            source,
            platforms,
            departures,
            status,
            clock,
            stale_threshold,
        }
    }

    /// Run one load.
    ///
    /// The feed's own last-updated time is recorded before any filtering, so
    /// it is stored even when every departure turns out to be stale. Stale
    /// departures and failed platform lookups are logged and never fail the
    /// load.
    pub async fn load(&self) -> Result<(), LoadError> {
        let snapshot = self.source.fetch().await?;

        self.status
            .set_last_updated(snapshot.last_updated)
            .await
            .map_err(LoadError::Status)?;

        let now = (self.clock)();
        let cutoff = now - self.stale_threshold;

        let fresh: Vec<Departure> = snapshot
            .departures
            .into_iter()
            .filter(|departure| {
                if departure.last_updated < cutoff {
                    error!(
                        atco_code = %departure.atco_code,
                        last_updated = %departure.last_updated,
                        stale_data_threshold = %self.stale_threshold,
                        age_of_data = %(now - departure.last_updated),
                        "error with source data - stale data received"
                    );
                    return false;
                }
                true
            })
            .map(|departure| self.with_platform(departure))
            .collect();

        info!(departures = fresh.len(), "storing departures");
        self.departures
            .store(fresh)
            .await
            .map_err(LoadError::Store)
    }

    fn with_platform(&self, mut departure: Departure) -> Departure {
        match self.platforms.platform_for(&departure.atco_code) {
            Ok(platform) => departure.platform = platform,
            Err(e) => {
                error!(error = %e, atco_code = %departure.atco_code, "error getting platform name");
                departure.platform = None;
            }
        }
        departure
    }
}
