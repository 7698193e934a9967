//! HTTP client for the Open-Meteo forecast endpoint
//!
//! This module builds the forecast request URL, performs the GET request and
//! decodes the response body into a `WeatherRecord`.

use crate::config::WeatherConfig;
use crate::core::{WeatherRecord, WeatherSource};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors that can occur while fetching a forecast.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    /// The body is not a valid forecast document.
    #[error("failed to decode forecast: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Builds the forecast request URL.
///
/// Coordinates are rendered with two decimals, and the hourly metric names are
/// joined with commas, e.g.
/// `https://api.open-meteo.com/v1/forecast?latitude=52.52&longitude=13.41&hourly=temperature_2m`.
pub fn build_forecast_url(endpoint: &str, latitude: f64, longitude: f64, hourly: &[String]) -> String {
    format!(
        "{}?latitude={:.2}&longitude={:.2}&hourly={}",
        endpoint,
        latitude,
        longitude,
        hourly.join(",")
    )
}

/// Decodes a raw forecast JSON document.
///
/// # Returns
/// * `Ok(WeatherRecord)` if the body contains a numeric `elevation` and an
///   `hourly` object
/// * `Err(FetchError::Decode)` otherwise
pub fn parse_record(text: &str) -> Result<WeatherRecord, FetchError> {
    Ok(serde_json::from_str(text)?)
}

/// Fetches forecasts from an Open-Meteo compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    url: String,
}

impl OpenMeteoClient {
    /// Creates a new client for the configured location.
    pub fn new(config: &WeatherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let url = build_forecast_url(
            &config.endpoint,
            config.latitude,
            config.longitude,
            &config.hourly,
        );
        Ok(Self { client, url })
    }

    /// The full request URL used on every fetch.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<WeatherRecord, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let text = response.text().await?;
        debug!(bytes = text.len(), "Received forecast response");
        parse_record(&text)
    }
}
