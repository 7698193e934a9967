//! Configuration management for WeatherWatch
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer defaults, a `weatherwatch.toml` file, environment variables
//! and command-line arguments.

use crate::cli::Cli;
use anyhow::{bail, ensure, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the poll loop.
    pub poller: PollerConfig,
    /// Configuration for the forecast endpoint and location.
    pub weather: WeatherConfig,
    /// Configuration for the metrics logger.
    pub metrics: MetricsConfig,
    /// Notification channels, in dispatch order.
    pub senders: Vec<SenderConfig>,
}

/// Configuration for the poll loop.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PollerConfig {
    /// Time between two poll cycles, in milliseconds.
    pub interval_ms: u64,
    /// What to do after a failed poll cycle.
    pub failure_policy: FailurePolicy,
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Decides whether the poller keeps running after a failed cycle.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and wait for the next tick.
    #[default]
    Continue,
    /// Stop polling and report the failure to the caller.
    Stop,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Continue => write!(f, "continue"),
            FailurePolicy::Stop => write!(f, "stop"),
        }
    }
}

/// Configuration for the forecast endpoint and location.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WeatherConfig {
    /// The forecast endpoint, without query string.
    pub endpoint: String,
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// Hourly metrics to request (e.g. `temperature_2m`).
    pub hourly: Vec<String>,
    /// HTTP request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.open-meteo.com/v1/forecast".to_string(),
            latitude: 52.52,
            longitude: 13.41,
            hourly: vec!["temperature_2m".to_string()],
            timeout_ms: 10_000,
        }
    }
}

/// Configuration for the metrics logger.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Log a metrics snapshot periodically.
    pub log_metrics: bool,
    /// Seconds between two snapshots.
    pub log_interval_seconds: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            log_metrics: false,
            log_interval_seconds: 60,
        }
    }
}

/// A single notification channel.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SenderConfig {
    /// Text message to a phone number.
    Sms { number: String },
    /// Mail to an address.
    Email { address: String },
    /// JSON POST to an HTTP endpoint.
    Webhook {
        url: String,
        #[serde(default = "default_webhook_timeout_ms")]
        timeout_ms: u64,
    },
}

fn default_webhook_timeout_ms() -> u64 {
    10_000
}

impl Config {
    /// Loads the application configuration.
    ///
    /// Sources are merged in order of increasing precedence: built-in
    /// defaults, the TOML file given by `--config`, `WEATHERWATCH_`
    /// environment variables (`__` separates nested keys, e.g.
    /// `WEATHERWATCH_POLLER__INTERVAL_MS=1000`) and command-line arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed command-line arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(path) = &cli.config {
            if !path.exists() {
                bail!("configuration file not found: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Config = figment
            .merge(Env::prefixed("WEATHERWATCH_").split("__"))
            .merge(cli)
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants that deserialization alone cannot express.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.poller.interval_ms > 0, "poller.interval_ms must be greater than zero");
        ensure!(
            (-90.0..=90.0).contains(&self.weather.latitude),
            "weather.latitude must be between -90 and 90, got {}",
            self.weather.latitude
        );
        ensure!(
            (-180.0..=180.0).contains(&self.weather.longitude),
            "weather.longitude must be between -180 and 180, got {}",
            self.weather.longitude
        );
        ensure!(!self.weather.hourly.is_empty(), "weather.hourly must name at least one metric");
        ensure!(!self.weather.endpoint.is_empty(), "weather.endpoint must not be empty");
        ensure!(self.weather.timeout_ms > 0, "weather.timeout_ms must be greater than zero");
        ensure!(
            !self.metrics.log_metrics || self.metrics.log_interval_seconds > 0,
            "metrics.log_interval_seconds must be greater than zero"
        );

        for (i, sender) in self.senders.iter().enumerate() {
            let empty = match sender {
                SenderConfig::Sms { number } => number.trim().is_empty(),
                SenderConfig::Email { address } => address.trim().is_empty(),
                SenderConfig::Webhook { url, .. } => url.trim().is_empty(),
            };
            ensure!(!empty, "senders[{}] has an empty destination", i);
            if let SenderConfig::Webhook { timeout_ms, .. } = sender {
                ensure!(*timeout_ms > 0, "senders[{}].timeout_ms must be greater than zero", i);
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            poller: PollerConfig::default(),
            weather: WeatherConfig::default(),
            metrics: MetricsConfig::default(),
            senders: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut config = Config::default();
        config.poller.interval_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("interval_ms"));
    }

    #[test]
    fn test_zero_fetch_timeout_is_rejected() {
        let mut config = Config::default();
        config.weather.timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("weather.timeout_ms"));
    }

    #[test]
    fn test_zero_webhook_timeout_is_rejected() {
        let mut config = Config::default();
        config.senders = vec![
            SenderConfig::Sms { number: "719".to_string() },
            SenderConfig::Webhook {
                url: "https://hooks.example.com/weather".to_string(),
                timeout_ms: 0,
            },
        ];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("senders[1].timeout_ms"));
    }

    #[test]
    fn test_out_of_range_coordinates_are_rejected() {
        let mut config = Config::default();
        config.weather.latitude = 91.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.weather.longitude = -180.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_sender_destination_is_rejected() {
        let mut config = Config::default();
        config.senders = vec![
            SenderConfig::Sms { number: "719".to_string() },
            SenderConfig::Email { address: " ".to_string() },
        ];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("senders[1]"));
    }

    #[test]
    fn test_failure_policy_display() {
        assert_eq!(FailurePolicy::Continue.to_string(), "continue");
        assert_eq!(FailurePolicy::Stop.to_string(), "stop");
    }
}
