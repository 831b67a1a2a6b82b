//! NaPTAN download and `StopsInArea.csv` parsing.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::time::Duration;

use tracing::{debug, info};
use zip::ZipArchive;
use zip::result::ZipError;

use super::StopsInAreaSource;
use super::error::NaptanError;

/// Default NaPTAN CSV download.
const DEFAULT_URL: &str = "https://naptan.api.dft.gov.uk/v1/access-nodes?dataFormat=csv";

/// Configuration for the NaPTAN client.
#[derive(Debug, Clone)]
pub struct NaptanConfig {
    /// URL of the zipped CSV export
    pub url: String,
    /// Name of the stops-in-area file inside the archive
    pub filename: String,
    /// Column holding the stop area code
    pub area_column: usize,
    /// Column holding the member stop's ATCO code
    pub stop_column: usize,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for NaptanConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            filename: "StopsInArea.csv".to_string(),
            area_column: 0,
            stop_column: 1,
            timeout: Duration::from_secs(120),
        }
    }
}

impl NaptanConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_columns(mut self, area_column: usize, stop_column: usize) -> Self {
        self.area_column = area_column;
        self.stop_column = stop_column;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Downloads stop-area membership from NaPTAN.
#[derive(Debug, Clone)]
pub struct NaptanClient {
    http: reqwest::Client,
    config: NaptanConfig,
}

impl NaptanClient {
    pub fn new(config: NaptanConfig) -> Result<Self, NaptanError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    async fn download(&self) -> Result<Vec<u8>, NaptanError> {
        let response = self.http.get(&self.config.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NaptanError::Status {
                url: self.config.url.clone(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

impl StopsInAreaSource for NaptanClient {
    async fn fetch_stops_in_area(&self) -> Result<HashMap<String, Vec<String>>, NaptanError> {
        let archive = self.download().await?;
        debug!(bytes = archive.len(), "downloaded NaPTAN archive");

        let config = self.config.clone();
        let areas = tokio::task::spawn_blocking(move || {
            parse_stops_in_area(
                &archive,
                &config.filename,
                config.area_column,
                config.stop_column,
            )
        })
        .await
        .map_err(|e| NaptanError::Task(e.to_string()))??;

        info!(areas = areas.len(), "parsed stops in area");
        Ok(areas)
    }
}

/// Read `filename` from a zip archive and group stop codes by area.
///
/// The first row is a header. Stops keep their file order within an area.
pub fn parse_stops_in_area(
    archive: &[u8],
    filename: &str,
    area_column: usize,
    stop_column: usize,
) -> Result<HashMap<String, Vec<String>>, NaptanError> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let file = match zip.by_name(filename) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => {
            return Err(NaptanError::MissingFile {
                filename: filename.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    group_rows(file, area_column, stop_column)
}

fn group_rows<R: Read>(
    reader: R,
    area_column: usize,
    stop_column: usize,
) -> Result<HashMap<String, Vec<String>>, NaptanError> {
    let needed = area_column.max(stop_column) + 1;
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut areas: HashMap<String, Vec<String>> = HashMap::new();
    for record in csv.records() {
        let record = record?;
        let (Some(area), Some(stop)) = (record.get(area_column), record.get(stop_column)) else {
            return Err(NaptanError::ShortRow {
                line: record.position().map_or(0, |p| p.line()),
                columns: record.len(),
                needed,
            });
        };
        areas
            .entry(area.to_string())
            .or_default()
            .push(stop.to_string());
    }

    Ok(areas)
}
