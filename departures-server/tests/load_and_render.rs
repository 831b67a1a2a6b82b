//! Feed to cache to API, end to end against the in-process store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Europe::London;
use httpmock::prelude::*;
use serde_json::{Value, json};

use departures_server::departures::{DeparturesApi, DeparturesLoader, Outcome};
use departures_server::domain::{Clock, fixed_clock};
use departures_server::feed::{FeedClient, FeedConfig};
use departures_server::platforms::StaticPlatformNames;
use departures_server::store::{
    DepartureRepository, DepartureStore, MemoryPool, StopsInAreaRepository, StopsInAreaStore,
    StoreConfig, SystemStatusRepository, SystemStatusStore,
};

const LAST_UPDATED: &str = "2021-01-21T15:34:54Z";

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn display(atco_code: &str, slots: &[(&str, &str, &str, &str)], last_updated: &str) -> Value {
    let mut display = json!({
        "Id": 1,
        "Line": "Eccles",
        "TLAREF": "SPS",
        "PIDREF": "SPS-PID01",
        "StationLocation": "St Peter's Square",
        "AtcoCode": atco_code,
        "Direction": "Incoming",
        "MessageBoard": "",
        "LastUpdated": last_updated,
    });
    for i in 0..4 {
        let (dest, carriages, status, wait) = slots.get(i).copied().unwrap_or(("", "", "", ""));
        display[format!("Dest{i}")] = json!(dest);
        display[format!("Carriages{i}")] = json!(carriages);
        display[format!("Status{i}")] = json!(status);
        display[format!("Wait{i}")] = json!(wait);
    }
    display
}

fn feed_body() -> Value {
    json!({
        "value": [
            display(
                "9400ZZMASTP1",
                &[
                    ("Victoria", "Single", "Due", "07"),
                    ("Bury", "Double", "Due", "DELAY"),
                ],
                LAST_UPDATED,
            ),
            display(
                "9400ZZMASTP2",
                &[("Altrincham", "Double", "Arrived", "0")],
                LAST_UPDATED,
            ),
            // Second board for the same stop; ignored.
            display(
                "9400ZZMASTP2",
                &[("Eccles", "Single", "Due", "1")],
                LAST_UPDATED,
            ),
            display(
                "9400ZZMASTP3",
                &[("Piccadilly", "Single", "Departing", "0")],
                LAST_UPDATED,
            ),
            // Stale board; dropped by the loader.
            display(
                "9400ZZMASTP4",
                &[("Ashton-under-Lyne", "Single", "Due", "3")],
                "2021-01-21T15:20:00Z",
            ),
        ]
    })
}

struct Harness {
    pool: MemoryPool,
    clock: Clock,
}

impl Harness {
    fn new(now: &str) -> Self {
        Self {
            pool: MemoryPool::new(&StoreConfig::default()),
            clock: fixed_clock(ts(now)),
        }
    }

    fn departures(&self) -> DepartureRepository<MemoryPool> {
        DepartureRepository::new(
            self.pool.clone(),
            "metrolink_departures",
            Duration::from_secs(15),
        )
    }

    fn status(&self) -> SystemStatusRepository<MemoryPool> {
        SystemStatusRepository::new(self.pool.clone(), "metrolink_departures_service_status")
    }

    fn stops(&self) -> StopsInAreaRepository<MemoryPool> {
        StopsInAreaRepository::new(
            self.pool.clone(),
            "stops_in_area",
            Duration::from_secs(90_000),
        )
    }

    fn api(
        &self,
    ) -> DeparturesApi<
        StopsInAreaRepository<MemoryPool>,
        DepartureRepository<MemoryPool>,
        SystemStatusRepository<MemoryPool>,
    > {
        DeparturesApi::new(
            self.stops(),
            Arc::new(self.departures()),
            self.status(),
            self.clock.clone(),
            TimeDelta::seconds(30),
            London,
        )
    }

    async fn load_from(&self, server: &MockServer) {
        let feed = FeedClient::new(
            FeedConfig::new("secret").with_api_url(server.url("/odata/Metrolinks")),
        )
        .unwrap();
        DeparturesLoader::new(
            feed,
            StaticPlatformNames::default(),
            self.departures(),
            self.status(),
            self.clock.clone(),
            TimeDelta::seconds(30),
        )
        .load()
        .await
        .unwrap();
    }

    async fn seed_areas(&self) {
        self.stops()
            .store(HashMap::from([(
                "940GZZMASTP".to_string(),
                (1..=4).map(|i| format!("9400ZZMASTP{i}")).collect(),
            )]))
            .await
            .unwrap();
    }
}

async fn feed_server() -> MockServer {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/odata/Metrolinks")
                .header("Ocp-Apim-Subscription-Key", "secret");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(feed_body());
        })
        .await;
    server
}

#[tokio::test]
async fn loaded_area_renders_sorted_departures() {
    let server = feed_server().await;
    let harness = Harness::new("2021-01-21T15:35:00Z");
    harness.seed_areas().await;
    harness.load_from(&server).await;

    let outcome = harness.api().render("940gzzmastp").await.unwrap();
    let Outcome::Departures(response) = outcome else {
        panic!("expected departures, got {outcome:?}");
    };

    let rows: Vec<_> = response
        .departures
        .iter()
        .map(|d| {
            (
                d.sequence,
                d.destination.as_str(),
                d.wait.to_string(),
                d.platform.as_deref(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        [
            (0, "Piccadilly", "0".to_string(), Some("B")),
            (1, "Altrincham", "0".to_string(), Some("C")),
            (2, "Victoria", "07".to_string(), Some("D")),
            (3, "Bury", "DELAY".to_string(), Some("D")),
        ]
    );
    assert_eq!(response.requested_location, "940GZZMASTP");
    assert_eq!(response.last_updated.to_rfc3339(), "2021-01-21T15:34:54+00:00");
}

#[tokio::test]
async fn status_is_recorded_even_when_everything_is_stale() {
    let server = feed_server().await;
    let harness = Harness::new("2021-01-21T15:40:00Z");
    harness.load_from(&server).await;

    assert_eq!(
        harness.status().get_last_updated().await.unwrap(),
        ts(LAST_UPDATED)
    );
    assert!(
        harness
            .departures()
            .get("9400ZZMASTP1")
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn single_stop_renders_only_that_stop() {
    let server = feed_server().await;
    let harness = Harness::new("2021-01-21T15:35:00Z");
    harness.load_from(&server).await;

    let Outcome::Departures(response) = harness.api().render("9400ZZMASTP1").await.unwrap() else {
        panic!("expected departures");
    };
    assert_eq!(response.departures.len(), 2);
    assert!(
        response
            .departures
            .iter()
            .all(|d| d.atco_code == "9400ZZMASTP1")
    );
}

#[tokio::test]
async fn cached_departures_expire() {
    let server = feed_server().await;
    let harness = Harness::new("2021-01-21T15:35:00Z");
    let short_lived = DepartureRepository::new(
        harness.pool.clone(),
        "metrolink_departures",
        Duration::from_millis(50),
    );
    let feed = FeedClient::new(
        FeedConfig::new("secret").with_api_url(server.url("/odata/Metrolinks")),
    )
    .unwrap();
    DeparturesLoader::new(
        feed,
        StaticPlatformNames::default(),
        short_lived,
        harness.status(),
        harness.clock.clone(),
        TimeDelta::seconds(30),
    )
    .load()
    .await
    .unwrap();

    assert!(harness.departures().get("9400ZZMASTP1").await.is_ok());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(
        harness
            .departures()
            .get("9400ZZMASTP1")
            .await
            .unwrap_err()
            .is_not_found()
    );
}
