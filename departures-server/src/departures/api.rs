//! The departures query: validate, check freshness, fan out, sort, render.

use std::sync::Arc;

use chrono::{SecondsFormat, TimeDelta};
use chrono_tz::Tz;
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Clock, Departure, LocationCode};
use crate::error::ErrorList;
use crate::store::{DepartureStore, StopsInAreaStore, StoreError, SystemStatusStore};

use super::envelope::{DeparturesResponse, ErrorResponse, departures_response};
use super::sort::sort_departures;

/// Message for a code that does not look like a stop or stop area.
pub const INVALID_LOCATION: &str = "invalid StopAreaCode or AtcoCode";

/// Message for a well-formed stop area code with no known stops.
pub const UNKNOWN_STOP_AREA: &str = "invalid StopAreaCode";

/// Answer to a departures query that is not a hard failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Departures(DeparturesResponse),
    /// Malformed code or unknown stop area.
    BadRequest(ErrorResponse),
    /// The feed has not updated within the staleness threshold.
    Stale(ErrorResponse),
}

/// A failure reading one stop's departures.
#[derive(Debug, Error)]
pub enum StopReadError {
    #[error("error getting departures for AtcoCode '{atco_code}': {source}")]
    Store {
        atco_code: String,
        #[source]
        source: StoreError,
    },

    #[error("error getting departures for AtcoCode '{atco_code}': task failed: {message}")]
    Task { atco_code: String, message: String },
}

/// Hard failures of a departures query.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("error getting Metrolink departures system status: {0}")]
    SystemStatus(#[source] StoreError),

    #[error("error getting ATCO codes for '{location}': {source}")]
    StopsInArea {
        location: String,
        #[source]
        source: StoreError,
    },

    #[error("error fetching Metrolink departures for '{location}': {errors}")]
    Departures {
        location: String,
        errors: ErrorList<StopReadError>,
    },
}

/// Answers departures queries from the cache.
pub struct DeparturesApi<A, D, T> {
    stops_in_area: A,
    departures: Arc<D>,
    status: T,
    clock: Clock,
    stale_threshold: TimeDelta,
    time_zone: Tz,
}

impl<A, D, T> DeparturesApi<A, D, T>
where
    A: StopsInAreaStore,
    D: DepartureStore + 'static,
    T: SystemStatusStore,
{
    pub fn new(
        stops_in_area: A,
        departures: Arc<D>,
        status: T,
        clock: Clock,
        stale_threshold: TimeDelta,
        time_zone: Tz,
    ) -> Self {
        Self {
            stops_in_area,
            departures,
            status,
            clock,
            stale_threshold,
            time_zone,
        }
    }

    /// Departures for a stop or every stop in a stop area.
    ///
    /// The code is matched case-insensitively. A stale feed is reported
    /// before any stop is read.
    pub async fn render(&self, location: &str) -> Result<Outcome, ApiError> {
        let requested = location.to_uppercase();

        let code = match LocationCode::parse(&requested) {
            Ok(code) => code,
            Err(e) => {
                debug!(location = %requested, reason = %e, "rejected location code");
                return Ok(Outcome::BadRequest(ErrorResponse::new(
                    requested,
                    INVALID_LOCATION,
                )));
            }
        };

        let last_updated = self
            .status
            .get_last_updated()
            .await
            .map_err(ApiError::SystemStatus)?;

        if (self.clock)() - last_updated > self.stale_threshold {
            let at = last_updated.to_rfc3339_opts(SecondsFormat::Secs, true);
            warn!(location = %requested, last_updated = %at, "departures data is outdated");
            return Ok(Outcome::Stale(ErrorResponse::new(
                requested,
                format!("Metrolink departures data is outdated: last updated at {at}"),
            )));
        }

        let atco_codes = match self.atco_codes(&code).await {
            Ok(codes) => codes,
            Err(e) if e.is_not_found() => {
                return Ok(Outcome::BadRequest(ErrorResponse::new(
                    requested,
                    UNKNOWN_STOP_AREA,
                )));
            }
            Err(source) => {
                return Err(ApiError::StopsInArea {
                    location: requested,
                    source,
                });
            }
        };

        let mut departures =
            self.read_stops(atco_codes)
                .await
                .map_err(|errors| ApiError::Departures {
                    location: requested.clone(),
                    errors,
                })?;

        sort_departures(&mut departures);

        Ok(Outcome::Departures(departures_response(
            &requested,
            departures,
            last_updated,
            self.time_zone,
        )))
    }

    async fn atco_codes(&self, code: &LocationCode) -> Result<Vec<String>, StoreError> {
        if code.is_stop() {
            return Ok(vec![code.as_str().to_string()]);
        }
        self.stops_in_area.get(code.as_str()).await
    }

    /// Read every stop concurrently.
    ///
    /// A stop with nothing cached contributes no departures. Any other
    /// failure fails the whole read, reporting every failed stop. Each read
    /// runs as its own task, so abandoning this future leaves the reads to
    /// finish on their own.
    async fn read_stops(
        &self,
        atco_codes: Vec<String>,
    ) -> Result<Vec<Departure>, ErrorList<StopReadError>> {
        let tasks: Vec<_> = atco_codes
            .into_iter()
            .map(|atco_code| {
                let store = Arc::clone(&self.departures);
                let handle = tokio::spawn({
                    let atco_code = atco_code.clone();
                    async move { store.get(&atco_code).await }
                });
                async move { (atco_code, handle.await) }
            })
            .collect();

        let mut departures = Vec::new();
        let mut errors = ErrorList::new();

        for (atco_code, joined) in join_all(tasks).await {
            match joined {
                Ok(Ok(found)) => departures.extend(found),
                Ok(Err(e)) if e.is_not_found() => {
                    debug!(atco_code = %atco_code, "no departures cached for stop");
                }
                Ok(Err(source)) => errors.push(StopReadError::Store { atco_code, source }),
                Err(e) => errors.push(StopReadError::Task {
                    atco_code,
                    message: e.to_string(),
                }),
            }
        }

        if errors.is_empty() {
            Ok(departures)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, Utc};
    use chrono_tz::Europe::London;

    use super::*;
    use crate::domain::{Wait, fixed_clock};

    const NOW: &str = "2021-03-21T15:35:00Z";

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn departure(atco_code: &str, wait: &str, destination: &str) -> Departure {
        Departure {
            atco_code: atco_code.to_string(),
            order: 0,
            destination: destination.to_string(),
            carriages: "Single".to_string(),
            status: "Due".to_string(),
            wait: Wait::parse(wait),
            platform: None,
            last_updated: ts("2021-03-21T15:34:54Z"),
        }
    }

    /// Departures per stop; stops listed in `failing` return a server error.
    #[derive(Default)]
    struct FakeDepartures {
        by_stop: HashMap<String, Vec<Departure>>,
        failing: HashSet<String>,
        reads: AtomicUsize,
    }

    impl FakeDepartures {
        fn with(mut self, atco_code: &str, departures: Vec<Departure>) -> Self {
            self.by_stop.insert(atco_code.to_string(), departures);
            self
        }

        fn failing(mut self, atco_code: &str) -> Self {
            self.failing.insert(atco_code.to_string());
            self
        }
    }

    impl DepartureStore for FakeDepartures {
        async fn get(&self, atco_code: &str) -> Result<Vec<Departure>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(atco_code) {
                return Err(StoreError::Server {
                    message: "LOADING".into(),
                });
            }
            self.by_stop
                .get(atco_code)
                .cloned()
                .ok_or_else(|| StoreError::NotFound {
                    key: atco_code.to_string(),
                })
        }

        async fn store(&self, _departures: Vec<Departure>) -> Result<(), StoreError> {
            unreachable!("the API never writes departures")
        }
    }

    struct FakeAreas(Result<HashMap<String, Vec<String>>, ()>);

    impl StopsInAreaStore for FakeAreas {
        async fn get(&self, area_code: &str) -> Result<Vec<String>, StoreError> {
            match &self.0 {
                Ok(areas) => areas
                    .get(area_code)
                    .cloned()
                    .ok_or_else(|| StoreError::NotFound {
                        key: area_code.to_string(),
                    }),
                Err(()) => Err(StoreError::Pool {
                    message: "timed out waiting for connection".into(),
                }),
            }
        }

        async fn store(&self, _areas: HashMap<String, Vec<String>>) -> Result<(), StoreError> {
            unreachable!("the API never writes areas")
        }
    }

    struct FakeStatus(Option<DateTime<Utc>>);

    impl SystemStatusStore for FakeStatus {
        async fn get_last_updated(&self) -> Result<DateTime<Utc>, StoreError> {
            self.0.ok_or_else(|| StoreError::NotFound {
                key: "status".into(),
            })
        }

        async fn set_last_updated(&self, _at: DateTime<Utc>) -> Result<(), StoreError> {
            unreachable!("the API never writes the status")
        }
    }

    fn st_peters_square() -> FakeAreas {
        FakeAreas(Ok(HashMap::from([(
            "940GZZMASTP".to_string(),
            vec![
                "9400ZZMASTP1".to_string(),
                "9400ZZMASTP2".to_string(),
                "9400ZZMASTP3".to_string(),
            ],
        )])))
    }

    fn api(
        areas: FakeAreas,
        departures: Arc<FakeDepartures>,
        last_updated: Option<&str>,
    ) -> DeparturesApi<FakeAreas, FakeDepartures, FakeStatus> {
        DeparturesApi::new(
            areas,
            departures,
            FakeStatus(last_updated.map(ts)),
            fixed_clock(ts(NOW)),
            TimeDelta::seconds(30),
            London,
        )
    }

    fn expect_departures(outcome: Outcome) -> DeparturesResponse {
        match outcome {
            Outcome::Departures(response) => response,
            other => panic!("expected departures, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stop_area_merges_sorts_and_skips_missing_stops() {
        let departures = Arc::new(
            FakeDepartures::default()
                .with(
                    "9400ZZMASTP1",
                    vec![
                        departure("9400ZZMASTP1", "DELAY", "Bury"),
                        departure("9400ZZMASTP1", "7", "Victoria"),
                    ],
                )
                .with(
                    "9400ZZMASTP2",
                    vec![departure("9400ZZMASTP2", "2", "Altrincham")],
                )
                .with("9400ZZMAOTH1", vec![departure("9400ZZMAOTH1", "1", "Other")]),
        );
        // 9400ZZMASTP3 has nothing cached.

        let api = api(
            st_peters_square(),
            departures.clone(),
            Some("2021-03-21T15:34:54Z"),
        );
        let response = expect_departures(api.render("940gzzmastp").await.unwrap());

        assert_eq!(response.requested_location, "940GZZMASTP");
        let got: Vec<_> = response
            .departures
            .iter()
            .map(|d| (d.sequence, d.destination.as_str()))
            .collect();
        assert_eq!(got, [(0, "Altrincham"), (1, "Victoria"), (2, "Bury")]);
        assert_eq!(departures.reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn single_stop_skips_area_lookup() {
        let departures = Arc::new(
            FakeDepartures::default()
                .with("9400ZZMASTP1", vec![departure("9400ZZMASTP1", "4", "Bury")]),
        );
        let api = api(
            FakeAreas(Err(())),
            departures,
            Some("2021-03-21T15:34:54Z"),
        );

        let response = expect_departures(api.render("9400ZZMASTP1").await.unwrap());
        assert_eq!(response.departures.len(), 1);
    }

    #[tokio::test]
    async fn stop_with_nothing_cached_is_empty_success() {
        let api = api(
            st_peters_square(),
            Arc::new(FakeDepartures::default()),
            Some("2021-03-21T15:34:54Z"),
        );
        let response = expect_departures(api.render("9400ZZMASTP4").await.unwrap());
        assert!(response.departures.is_empty());
    }

    #[tokio::test]
    async fn invalid_code_is_bad_request() {
        let api = api(
            st_peters_square(),
            Arc::new(FakeDepartures::default()),
            Some("2021-03-21T15:34:54Z"),
        );

        for input in ["", "940XZZMASTP", "9400ZZMASTP5", "9400zzmastp12", "hello"] {
            match api.render(input).await.unwrap() {
                Outcome::BadRequest(body) => {
                    assert_eq!(body.error, INVALID_LOCATION);
                    assert_eq!(body.requested_location, input.to_uppercase());
                }
                other => panic!("expected bad request for {input:?}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn unknown_area_is_bad_request() {
        let api = api(
            st_peters_square(),
            Arc::new(FakeDepartures::default()),
            Some("2021-03-21T15:34:54Z"),
        );
        match api.render("940GZZMAXXX").await.unwrap() {
            Outcome::BadRequest(body) => assert_eq!(body.error, UNKNOWN_STOP_AREA),
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn area_lookup_failure_is_hard_error() {
        let api = api(
            FakeAreas(Err(())),
            Arc::new(FakeDepartures::default()),
            Some("2021-03-21T15:34:54Z"),
        );
        let err = api.render("940GZZMASTP").await.unwrap_err();
        assert!(matches!(err, ApiError::StopsInArea { .. }));
    }

    #[tokio::test]
    async fn stale_feed_never_reads_stops() {
        let departures = Arc::new(
            FakeDepartures::default()
                .with("9400ZZMASTP1", vec![departure("9400ZZMASTP1", "4", "Bury")]),
        );
        let api = api(
            st_peters_square(),
            departures.clone(),
            Some("2021-03-21T15:30:00Z"),
        );

        match api.render("940GZZMASTP").await.unwrap() {
            Outcome::Stale(body) => assert_eq!(
                body.error,
                "Metrolink departures data is outdated: last updated at 2021-03-21T15:30:00Z"
            ),
            other => panic!("expected stale, got {other:?}"),
        }
        assert_eq!(departures.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_status_is_hard_error() {
        let api = api(st_peters_square(), Arc::new(FakeDepartures::default()), None);
        let err = api.render("940GZZMASTP").await.unwrap_err();
        assert!(matches!(err, ApiError::SystemStatus(_)));
    }

    #[tokio::test]
    async fn every_failed_stop_is_reported() {
        let departures = Arc::new(
            FakeDepartures::default()
                .with("9400ZZMASTP1", vec![departure("9400ZZMASTP1", "4", "Bury")])
                .failing("9400ZZMASTP2")
                .failing("9400ZZMASTP3"),
        );
        let api = api(
            st_peters_square(),
            departures,
            Some("2021-03-21T15:34:54Z"),
        );

        match api.render("940GZZMASTP").await.unwrap_err() {
            ApiError::Departures { location, errors } => {
                assert_eq!(location, "940GZZMASTP");
                assert_eq!(errors.len(), 2);
                let message = errors.to_string();
                assert!(message.contains("9400ZZMASTP2"));
                assert!(message.contains("9400ZZMASTP3"));
            }
            other => panic!("expected departures error, got {other:?}"),
        }
    }
}
