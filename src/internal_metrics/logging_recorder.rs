//! A metrics recorder that periodically logs all captured metrics.

use crate::task_manager::TaskManager;
use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::{AtomicStorage, Registry};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A metrics recorder that keeps counters and gauges in memory and logs them
/// with `tracing::info!`.
#[derive(Clone)]
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl Default for LoggingRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingRecorder {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::atomic()),
        }
    }

    /// Installs a recorder as the global recorder and returns a handle to it.
    ///
    /// Must run before any metric handle is registered. Fails if a global
    /// recorder is already installed.
    pub fn install() -> anyhow::Result<Self> {
        let recorder = Self::new();
        metrics::set_global_recorder(recorder.clone())
            .map_err(|e| anyhow::anyhow!("failed to install logging recorder: {}", e))?;
        Ok(recorder)
    }

    /// Spawns a task that logs a snapshot every `interval`, plus a final one
    /// on shutdown.
    pub fn spawn_reporter(&self, interval: Duration, task_manager: &TaskManager) {
        let reporter = self.clone();
        let mut shutdown_rx = task_manager.get_shutdown_rx();
        task_manager.spawn("MetricsLogger", async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        reporter.log_snapshot();
                        debug!("Metrics logger received shutdown signal.");
                        break;
                    }
                    _ = ticker.tick() => reporter.log_snapshot(),
                }
            }
        });
    }

    /// Renders all counters and gauges, sorted by key.
    pub fn snapshot(&self) -> Vec<String> {
        let mut lines = Vec::new();

        for (key, counter) in self.registry.get_counter_handles() {
            lines.push(format!("[Counter] {}: {}", render_key(&key), counter.load(Ordering::Relaxed)));
        }
        for (key, gauge) in self.registry.get_gauge_handles() {
            let value = f64::from_bits(gauge.load(Ordering::Relaxed));
            lines.push(format!("[Gauge] {}: {}", render_key(&key), value));
        }
        // Histograms are not logged.

        lines.sort();
        lines
    }

    fn log_snapshot(&self) {
        info!("--- Metrics Snapshot ---");
        for line in self.snapshot() {
            info!("{}", line);
        }
    }
}

/// Renders a key as `name{label=value,...}`.
fn render_key(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|label| format!("{}={}", label.key(), label.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl Recorder for LoggingRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry.get_or_create_counter(key, |c| c.clone()).into()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |g| g.clone()).into()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry.get_or_create_histogram(key, |h| h.clone()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::watch;
    use tracing_test::traced_test;

    #[test]
    fn test_snapshot_contains_counters_and_gauges() {
        let recorder = LoggingRecorder::new();

        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("poll_cycles_total").increment(3);
            metrics::gauge!("last_elevation_meters").set(38.0);
        });

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().any(|l| l.starts_with("[Counter] poll_cycles_total") && l.ends_with(": 3")));
        assert!(snapshot.iter().any(|l| l.starts_with("[Gauge] last_elevation_meters") && l.ends_with(": 38")));
    }

    #[test]
    fn test_metrics_handle_records_deliveries() {
        let recorder = LoggingRecorder::new();

        metrics::with_local_recorder(&recorder, || {
            let metrics = crate::internal_metrics::Metrics::new();
            metrics.poll_cycles_total.increment(1);
            metrics.record_delivery("sms", true);
            metrics.record_delivery("sms", false);
        });

        let snapshot = recorder.snapshot();
        assert!(snapshot.iter().any(|l| l.starts_with("[Counter] poll_cycles_total")));
        assert_eq!(snapshot.iter().filter(|l| l.contains("deliveries_total")).count(), 2);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_reporter_logs_every_interval_until_shutdown() {
        // Arrange
        let recorder = LoggingRecorder::new();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("poll_cycles_total").increment(2);
        });
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task_manager = TaskManager::new(shutdown_rx);

        // Act
        recorder.spawn_reporter(Duration::from_secs(60), &task_manager);
        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(!logs_contain("--- Metrics Snapshot ---"));

        tokio::time::sleep(Duration::from_secs(2)).await;

        // Assert
        assert!(logs_contain("--- Metrics Snapshot ---"));
        assert!(logs_contain("[Counter] poll_cycles_total: 2"));

        shutdown_tx.send(true).unwrap();
        let panicked = task_manager.shutdown().await;
        assert!(panicked.is_empty());
        assert!(logs_contain("Metrics logger received shutdown signal."));
    }
}
