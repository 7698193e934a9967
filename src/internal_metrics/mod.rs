//! # Internal Metrics Module
//!
//! Counters and gauges for the poll loop, recorded through the `metrics`
//! facade. Without an installed recorder every handle is a no-op.
//!
//! ## Components:
//!
//! - **`Metrics`**: A lightweight, cloneable struct that serves as the public
//!   API for the rest of the application. It provides high-level methods for
//!   updating the predefined metrics.
//!
//! - **`LoggingRecorder`**: (Defined in `logging_recorder.rs`) A recorder that
//!   keeps metric values in memory and logs a snapshot periodically.

pub mod logging_recorder;

use metrics::{Counter, Gauge, Unit};

/// The public API for the metrics system.
///
/// Handles are bound to whatever recorder is installed when `Metrics::new`
/// runs, so the recorder must be installed first.
#[derive(Clone)]
pub struct Metrics {
    pub poll_cycles_total: Counter,
    pub poll_cycle_failures_total: Counter,
    pub last_elevation_meters: Gauge,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Creates a new `Metrics` instance and registers descriptions for all
    /// supported metrics with the global recorder.
    pub fn new() -> Self {
        metrics::describe_counter!("poll_cycles_total", Unit::Count, "Total number of poll cycles started.");
        metrics::describe_counter!("poll_cycle_failures_total", Unit::Count, "Total number of poll cycles that failed to fetch or deliver.");
        metrics::describe_counter!("deliveries_total", Unit::Count, "Total number of delivery attempts, labeled by sender and outcome.");
        metrics::describe_gauge!("last_elevation_meters", "Elevation reported by the most recent successful fetch.");

        Self {
            poll_cycles_total: metrics::counter!("poll_cycles_total"),
            poll_cycle_failures_total: metrics::counter!("poll_cycle_failures_total"),
            last_elevation_meters: metrics::gauge!("last_elevation_meters"),
        }
    }

    /// Records the outcome of one delivery attempt.
    pub fn record_delivery(&self, sender: &str, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        metrics::counter!(
            "deliveries_total",
            "sender" => sender.to_string(),
            "outcome" => outcome
        )
        .increment(1);
    }
}
