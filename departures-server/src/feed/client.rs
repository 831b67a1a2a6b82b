//! Metrolink open data HTTP client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, error};

use crate::domain::DepartureSnapshot;

use super::DepartureSource;
use super::convert::normalize;
use super::error::FeedError;
use super::types::MetrolinksResponse;

/// Default URL of the Metrolinks endpoint.
const DEFAULT_API_URL: &str = "https://api.tfgm.com/odata/Metrolinks";

/// Header carrying the subscription key.
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// How much of an error body to log.
const LOGGED_BODY_CHARS: usize = 500;

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Subscription key for the open data API
    pub api_key: String,
    /// Metrolinks endpoint URL
    pub api_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl FeedConfig {
    /// Create a new config with the given subscription key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_millis(1500),
        }
    }

    /// Set a custom endpoint URL (for testing).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for the live departures feed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    api_url: String,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let mut headers = HeaderMap::new();
        let api_key =
            HeaderValue::from_str(&config.api_key).map_err(|_| FeedError::InvalidApiKey)?;
        headers.insert(SUBSCRIPTION_KEY_HEADER, api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url,
        })
    }
}

impl DepartureSource for FeedClient {
    async fn fetch(&self) -> Result<DepartureSnapshot, FeedError> {
        let response = self.http.get(&self.api_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or_default().to_string();
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(LOGGED_BODY_CHARS).collect();
            error!(
                status = status.as_u16(),
                reason = %reason,
                body = %body,
                "error response from data source"
            );
            return Err(FeedError::Status {
                status: status.as_u16(),
                reason,
            });
        }

        let body = response.text().await?;
        let parsed: MetrolinksResponse =
            serde_json::from_str(&body).map_err(|e| FeedError::Decode {
                message: e.to_string(),
            })?;

        if parsed.displays.is_empty() {
            return Err(FeedError::Empty);
        }

        let snapshot = normalize(parsed.displays);
        debug!(
            departures = snapshot.departures.len(),
            last_updated = %snapshot.last_updated,
            "fetched departures feed"
        );
        Ok(snapshot)
    }
}
