//! brasil.io dataset download.
//!
//! A single blocking GET of the compressed `caso_full` CSV. There is no retry:
//! a failed request or non-success status is reported to the caller as-is.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::AppError;
use crate::io::ingest::RawTable;

pub const DEFAULT_DATASET_URL: &str = "https://data.brasil.io/dataset/covid19/caso_full.csv.gz";

/// Environment variable that overrides the dataset URL (read after loading `.env`).
pub const DATASET_URL_ENV: &str = "EPI_DATASET_URL";

// The host rejects requests without a browser-like agent.
const BROWSER_AGENT: &str = "Mozilla/5.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// `EPI_DATASET_URL` (after loading `.env`), falling back to the brasil.io URL.
pub fn dataset_url_from_env() -> String {
    dotenvy::dotenv().ok();
    std::env::var(DATASET_URL_ENV).unwrap_or_else(|_| DEFAULT_DATASET_URL.to_string())
}

pub struct DatasetClient {
    client: Client,
    url: String,
}

impl DatasetClient {
    pub fn new(url: impl Into<String>) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Client for `EPI_DATASET_URL` if set, else the default URL.
    pub fn from_env() -> Result<Self, AppError> {
        Self::new(dataset_url_from_env())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download and decode the table.
    pub fn fetch_table(&self) -> Result<RawTable, AppError> {
        log::info!("Downloading dataset from {}", self.url);
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| AppError::new(4, format!("Dataset request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Dataset request failed with status {}.", resp.status()),
            ));
        }

        let bytes = resp
            .bytes()
            .map_err(|e| AppError::new(4, format!("Failed to read dataset body: {e}")))?;
        log::info!("Downloaded {} bytes", bytes.len());

        Ok(RawTable::from_bytes(&bytes)?)
    }
}
