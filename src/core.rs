//! Core domain types and service traits for WeatherWatch
//!
//! This module defines the weather record that flows through a poll cycle and
//! the two trait contracts that the poller is built on: a source of records
//! and a sender that delivers them.

use crate::fetcher::FetchError;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single forecast response, decoded from the weather API.
///
/// Only `elevation` and `hourly` are kept; every other top-level field of the
/// response body is ignored during decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WeatherRecord {
    /// Elevation of the forecast grid cell, in meters.
    pub elevation: f64,
    /// Hourly forecast series keyed by metric name (e.g. `time`, `temperature_2m`).
    pub hourly: Map<String, Value>,
}

impl WeatherRecord {
    /// Returns the names of all hourly series, in the order the response listed them.
    pub fn series_names(&self) -> Vec<&str> {
        self.hourly.keys().map(String::as_str).collect()
    }

    /// Returns the numeric values of an hourly series.
    ///
    /// Null entries (the API emits them for hours without data) are skipped.
    /// Returns `None` if the series is missing or is not an array.
    pub fn series(&self, name: &str) -> Option<Vec<f64>> {
        let values = self.hourly.get(name)?.as_array()?;
        Some(values.iter().filter_map(Value::as_f64).collect())
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Produces one weather record per call.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetches and decodes the current forecast.
    ///
    /// # Returns
    /// * `Ok(WeatherRecord)` when the request succeeded and the body decoded
    /// * `Err(FetchError)` for network, HTTP status and decode failures
    async fn fetch(&self) -> Result<WeatherRecord, FetchError>;
}

/// Delivers weather records to a downstream channel.
#[async_trait]
pub trait Sender: Send + Sync {
    /// A short, descriptive name for the sender (e.g., "sms", "webhook").
    /// Used for logging and metrics.
    fn name(&self) -> &str;

    /// Delivers a record.
    ///
    /// # Arguments
    /// * `record` - The record to deliver
    ///
    /// # Returns
    /// * `Ok(())` if the record was delivered
    /// * `Err` if delivery failed
    async fn send(&self, record: &WeatherRecord) -> Result<()>;
}
