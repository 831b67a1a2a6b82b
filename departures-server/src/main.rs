use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use tracing::{debug, error, info, warn};

use departures_server::config::AppConfig;
use departures_server::departures::{DeparturesApi, DeparturesLoader};
use departures_server::domain::system_clock;
use departures_server::feed::{FeedClient, FeedConfig};
use departures_server::logging;
use departures_server::naptan::{NaptanClient, NaptanConfig, StopsInAreaLoader};
use departures_server::platforms::StaticPlatformNames;
use departures_server::schedule::{EventScheduler, LoadScheduler, LocalQueue};
use departures_server::store::{
    DepartureRepository, MemoryPool, StopsInAreaRepository, StoreConfig, SystemStatusRepository,
};
use departures_server::web::{AppState, create_router};

/// How often to refresh stop-area membership (24 hours).
const STOPS_IN_AREA_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Body of each scheduled load message.
const LOAD_PAYLOAD: &str = "load";

// Configured durations are bounded to a year, well inside `TimeDelta`.
fn delta(d: Duration) -> TimeDelta {
    TimeDelta::from_std(d).expect("configured duration out of range")
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    logging::init(config.log_format);

    if config.feed_api_key.is_empty() {
        warn!("TFGM_API_KEY not set. Feed requests will fail.");
    }

    let pool = MemoryPool::new(&StoreConfig {
        max_capacity: config.store_max_capacity,
        max_connections: config.store_pool_size,
    });
    let clock = system_clock();
    let stale_threshold = delta(config.stale_data_threshold);

    let departures_repo = || {
        DepartureRepository::new(
            pool.clone(),
            config.departures_key_prefix.clone(),
            config.departures_ttl,
        )
    };
    let status_repo =
        || SystemStatusRepository::new(pool.clone(), config.system_status_key.clone());
    let stops_repo = || {
        StopsInAreaRepository::new(
            pool.clone(),
            config.stops_in_area_key_prefix.clone(),
            config.stops_in_area_ttl,
        )
    };

    // Stop-area membership: load now, then refresh daily.
    let naptan = NaptanClient::new(
        NaptanConfig::default()
            .with_url(config.naptan_url.clone())
            .with_filename(config.naptan_filename.clone())
            .with_columns(config.naptan_area_column, config.naptan_stop_column),
    )
    .expect("Failed to create NaPTAN client");
    let stops_loader = StopsInAreaLoader::new(naptan, stops_repo());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STOPS_IN_AREA_REFRESH_INTERVAL);
        loop {
            interval.tick().await;
            match stops_loader.load().await {
                Ok(()) => info!("refreshed stops in area"),
                Err(e) => error!(error = %e, "failed to load stops in area"),
            }
        }
    });

    // Feed loads, triggered by delayed messages from the scheduler.
    let feed = FeedClient::new(
        FeedConfig::new(config.feed_api_key.clone())
            .with_api_url(config.feed_url.clone())
            .with_timeout(config.http_timeout),
    )
    .expect("Failed to create feed client");
    let loader = DeparturesLoader::new(
        feed,
        StaticPlatformNames::default(),
        departures_repo(),
        status_repo(),
        clock.clone(),
        stale_threshold,
    );

    let (queue, mut deliveries) = LocalQueue::new();
    tokio::spawn(async move {
        while let Some(delivery) = deliveries.recv().await {
            debug!(id = %delivery.id, "running scheduled load");
            if let Err(e) = loader.load().await {
                error!(id = %delivery.id, error = %e, "error loading Metrolink departures");
            }
        }
    });

    let load_scheduler = LoadScheduler::new(
        EventScheduler::new(queue, config.schedule_id_prefix.clone(), clock.clone()),
        delta(config.schedule_horizon),
        delta(config.schedule_frequency),
        LOAD_PAYLOAD,
        clock.clone(),
    )
    .expect("Invalid schedule configuration");
    let schedule_every = config.schedule_horizon.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(schedule_every);
        loop {
            interval.tick().await;
            if let Err(e) = load_scheduler.schedule().await {
                error!(error = %e, "error scheduling departures loads");
            }
        }
    });

    // Query API.
    let api = DeparturesApi::new(
        stops_repo(),
        Arc::new(departures_repo()),
        status_repo(),
        clock,
        stale_threshold,
        config.time_zone,
    );
    let app = create_router(AppState::new(api));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .expect("Failed to bind listen address");
    info!(addr = %config.listen_addr, "departures server listening");
    info!("  GET  /health                 - Health check");
    info!("  GET  /departures/:location   - Departures for a stop or stop area");

    axum::serve(listener, app).await.expect("Server error");
}
