//! The poll loop: fetch a forecast on every tick and hand it to every sender.
//!
//! A `Poller` owns the weather source, the ordered list of senders and a
//! shutdown channel. `start` waits on the ticker and on the shutdown channel
//! at the same time; whichever is ready first wins. A cycle that has started
//! always runs to completion, so shutdown is observed between cycles, at most
//! one interval after it was requested.

use crate::config::FailurePolicy;
use crate::core::{Sender, WeatherRecord, WeatherSource};
use crate::fetcher::FetchError;
use crate::internal_metrics::Metrics;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

/// A sender that failed to deliver during a cycle.
#[derive(Debug)]
pub struct DeliveryFailure {
    pub sender: String,
    pub error: anyhow::Error,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.sender, self.error)
    }
}

/// Errors produced by a single poll cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The forecast could not be fetched or decoded; no sender was invoked.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// At least one sender failed. The other senders still received the record.
    #[error("{} of {} deliveries failed: {}", .failures.len(), .attempted, join_failures(.failures))]
    Delivery {
        attempted: usize,
        failures: Vec<DeliveryFailure>,
    },
}

fn join_failures(failures: &[DeliveryFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that end the poll loop.
#[derive(Debug, Error)]
pub enum PollerError {
    #[error("poll cycle failed and the failure policy is 'stop': {0}")]
    CycleFailed(#[source] CycleError),
}

/// The outcome of a successful poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub elevation: f64,
    pub delivered: usize,
    pub fetched_at: DateTime<Utc>,
}

/// A cloneable handle used to stop a running `Poller`.
#[derive(Clone, Debug)]
pub struct PollerHandle {
    shutdown_tx: Arc<watch::Sender<bool>>,
    closed: Arc<AtomicBool>,
}

impl PollerHandle {
    /// Requests shutdown.
    ///
    /// Returns `true` if this call issued the request and `false` if the
    /// poller was already closed. Closing more than once is a no-op.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Poller already closed, ignoring close request.");
            return false;
        }
        info!("Poller close requested.");
        self.shutdown_tx.send_replace(true);
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns a receiver that observes the same shutdown signal as the poller.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }
}

/// Polls a weather source on a fixed interval and dispatches each record.
pub struct Poller {
    source: Arc<dyn WeatherSource>,
    senders: Vec<Arc<dyn Sender>>,
    interval: Duration,
    policy: FailurePolicy,
    metrics: Arc<Metrics>,
    handle: PollerHandle,
    shutdown_rx: watch::Receiver<bool>,
}

impl Poller {
    /// Creates a new poller.
    ///
    /// # Arguments
    /// * `source` - Where records come from
    /// * `senders` - Where records go, in dispatch order
    /// * `interval` - Time between two cycles; must be non-zero
    /// * `policy` - What to do after a failed cycle
    /// * `metrics` - Metric handles to update
    pub fn new(
        source: Arc<dyn WeatherSource>,
        senders: Vec<Arc<dyn Sender>>,
        interval: Duration,
        policy: FailurePolicy,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = PollerHandle {
            shutdown_tx: Arc::new(shutdown_tx),
            closed: Arc::new(AtomicBool::new(false)),
        };
        Self {
            source,
            senders,
            interval,
            policy,
            metrics,
            handle,
            shutdown_rx,
        }
    }

    pub fn handle(&self) -> PollerHandle {
        self.handle.clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs the poll loop until shutdown is requested, or until a cycle fails
    /// under `FailurePolicy::Stop`.
    ///
    /// The first cycle runs one full interval after the loop starts.
    #[instrument(skip_all, fields(interval_ms = self.interval.as_millis() as u64, policy = %self.policy))]
    pub async fn start(mut self) -> Result<(), PollerError> {
        info!(senders = self.senders.len(), "Starting the weather poller");

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                res = self.shutdown_rx.changed() => {
                    if res.is_err() {
                        warn!("Shutdown channel closed unexpectedly.");
                    }
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        match self.policy {
                            FailurePolicy::Continue => {
                                warn!(error = %e, "Poll cycle failed, waiting for the next tick.");
                            }
                            FailurePolicy::Stop => {
                                error!(error = %e, "Poll cycle failed, stopping the poller.");
                                self.handle.close();
                                return Err(PollerError::CycleFailed(e));
                            }
                        }
                    }
                }
            }
        }

        info!("Weather poller stopped gracefully");
        Ok(())
    }

    /// Runs one fetch-and-dispatch cycle.
    ///
    /// Every sender receives the record exactly once, in registration order.
    /// A failing sender does not stop delivery to the senders after it.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        self.metrics.poll_cycles_total.increment(1);

        let record = match self.source.fetch().await {
            Ok(record) => record,
            Err(e) => {
                self.metrics.poll_cycle_failures_total.increment(1);
                return Err(e.into());
            }
        };
        let fetched_at = Utc::now();
        info!(
            elevation = record.elevation,
            fetched_at = %fetched_at.to_rfc3339(),
            "Fetched weather forecast"
        );
        self.metrics.last_elevation_meters.set(record.elevation);

        let failures = self.dispatch(&record).await;
        if failures.is_empty() {
            Ok(CycleReport {
                elevation: record.elevation,
                delivered: self.senders.len(),
                fetched_at,
            })
        } else {
            self.metrics.poll_cycle_failures_total.increment(1);
            Err(CycleError::Delivery {
                attempted: self.senders.len(),
                failures,
            })
        }
    }

    async fn dispatch(&self, record: &WeatherRecord) -> Vec<DeliveryFailure> {
        let mut failures = Vec::new();
        for sender in &self.senders {
            match sender.send(record).await {
                Ok(()) => {
                    debug!(sender = sender.name(), "Delivered weather record");
                    self.metrics.record_delivery(sender.name(), true);
                }
                Err(e) => {
                    error!(sender = sender.name(), error = %e, "Failed to deliver weather record");
                    self.metrics.record_delivery(sender.name(), false);
                    failures.push(DeliveryFailure {
                        sender: sender.name().to_string(),
                        error: e,
                    });
                }
            }
        }
        failures
    }
}
