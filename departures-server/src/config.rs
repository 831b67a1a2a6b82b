//! Application configuration from environment variables.
//!
//! Every setting has a default except the feed subscription key. Durations
//! are whole numbers in the unit their variable name states, at most one
//! year.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;

use crate::logging::LogFormat;

/// Upper bound for every configured duration.
const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A variable that is set but cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid value '{value}' for {name}: {message}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
    pub message: String,
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Live departures feed endpoint
    pub feed_url: String,
    /// Feed subscription key; empty if unset
    pub feed_api_key: String,
    /// Timeout for feed requests
    pub http_timeout: Duration,

    /// Age beyond which feed data is not served or stored
    pub stale_data_threshold: Duration,

    pub departures_key_prefix: String,
    pub departures_ttl: Duration,
    pub system_status_key: String,
    pub stops_in_area_key_prefix: String,
    pub stops_in_area_ttl: Duration,

    /// Zipped NaPTAN CSV export
    pub naptan_url: String,
    pub naptan_filename: String,
    pub naptan_area_column: usize,
    pub naptan_stop_column: usize,

    /// How far ahead each scheduling run enqueues loads
    pub schedule_horizon: Duration,
    /// Interval between loads
    pub schedule_frequency: Duration,
    /// Prefix of scheduled message ids
    pub schedule_id_prefix: String,

    pub store_pool_size: usize,
    pub store_max_capacity: u64,

    /// Zone used for times in API responses
    pub time_zone: Tz,
    pub listen_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_url: "https://api.tfgm.com/odata/Metrolinks".to_string(),
            feed_api_key: String::new(),
            http_timeout: Duration::from_millis(1500),
            stale_data_threshold: Duration::from_secs(30),
            departures_key_prefix: "metrolink_departures".to_string(),
            departures_ttl: Duration::from_millis(15_000),
            system_status_key: "metrolink_departures_service_status".to_string(),
            stops_in_area_key_prefix: "stops_in_area".to_string(),
            stops_in_area_ttl: Duration::from_secs(25 * 60 * 60),
            naptan_url: "https://naptan.api.dft.gov.uk/v1/access-nodes?dataFormat=csv"
                .to_string(),
            naptan_filename: "StopsInArea.csv".to_string(),
            naptan_area_column: 0,
            naptan_stop_column: 1,
            schedule_horizon: Duration::from_secs(60),
            schedule_frequency: Duration::from_secs(10),
            schedule_id_prefix: "metrolink_departures_load".to_string(),
            store_pool_size: 16,
            store_max_capacity: 10_000,
            time_zone: chrono_tz::Europe::London,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log_format: LogFormat::Compact,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let d = Self::default();

        Ok(Self {
            feed_url: vars.string("TFGM_API_URL", d.feed_url),
            feed_api_key: vars.string("TFGM_API_KEY", d.feed_api_key),
            http_timeout: vars.millis("HTTP_CLIENT_TIMEOUT_MS", d.http_timeout)?,
            stale_data_threshold: vars.secs("STALE_DATA_THRESHOLD_SECS", d.stale_data_threshold)?,
            departures_key_prefix: vars.string("DEPARTURES_KEY_PREFIX", d.departures_key_prefix),
            departures_ttl: vars.millis("DEPARTURES_TTL_MS", d.departures_ttl)?,
            system_status_key: vars.string("SYSTEM_STATUS_KEY", d.system_status_key),
            stops_in_area_key_prefix: vars
                .string("STOPS_IN_AREA_KEY_PREFIX", d.stops_in_area_key_prefix),
            stops_in_area_ttl: vars.secs("STOPS_IN_AREA_TTL_SECS", d.stops_in_area_ttl)?,
            naptan_url: vars.string("NAPTAN_CSV_URL", d.naptan_url),
            naptan_filename: vars.string("NAPTAN_STOPS_IN_AREA_FILENAME", d.naptan_filename),
            naptan_area_column: vars
                .parse("NAPTAN_STOP_AREA_CODE_COLUMN_INDEX", d.naptan_area_column)?,
            naptan_stop_column: vars.parse("NAPTAN_ATCO_CODE_COLUMN_INDEX", d.naptan_stop_column)?,
            schedule_horizon: vars.secs("SCHEDULE_HORIZON_SECS", d.schedule_horizon)?,
            schedule_frequency: vars.secs("SCHEDULE_FREQUENCY_SECS", d.schedule_frequency)?,
            schedule_id_prefix: vars.string("SCHEDULE_ID_PREFIX", d.schedule_id_prefix),
            store_pool_size: vars.parse("STORE_POOL_SIZE", d.store_pool_size)?,
            store_max_capacity: vars.parse("STORE_MAX_CAPACITY", d.store_max_capacity)?,
            time_zone: vars.parse("TIME_ZONE", d.time_zone)?,
            listen_addr: vars.parse("LISTEN_ADDR", d.listen_addr)?,
            log_format: vars.parse("LOG_FORMAT", d.log_format)?,
        })
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn string(&self, name: &str, default: String) -> String {
        (self.0)(name).unwrap_or(default)
    }

    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        match (self.0)(name) {
            None => Ok(default),
            Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError {
                name,
                message: e.to_string(),
                value,
            }),
        }
    }

    fn secs(&self, name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        let secs = self.parse(name, default.as_secs())?;
        bounded(name, secs, Duration::from_secs(secs))
    }

    fn millis(&self, name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        let default = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
        let millis = self.parse(name, default)?;
        bounded(name, millis, Duration::from_millis(millis))
    }
}

fn bounded(name: &'static str, raw: u64, duration: Duration) -> Result<Duration, ConfigError> {
    if duration > MAX_DURATION {
        return Err(ConfigError {
            name,
            value: raw.to_string(),
            message: format!("must be at most {} seconds", MAX_DURATION.as_secs()),
        });
    }
    Ok(duration)
}
