//! The main application logic, decoupled from the entry point.

use crate::{
    config::Config,
    core::{Sender, WeatherSource},
    fetcher::OpenMeteoClient,
    internal_metrics::{logging_recorder::LoggingRecorder, Metrics},
    poller::{Poller, PollerHandle},
    senders,
    task_manager::TaskManager,
};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// A handle to the running application.
pub struct App {
    poller: Poller,
    handle: PollerHandle,
    task_manager: TaskManager,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// A handle that stops the poller directly, bypassing the external signal.
    pub fn poller_handle(&self) -> PollerHandle {
        self.handle.clone()
    }

    /// Runs the poller until shutdown, then waits for the background tasks.
    ///
    /// Returns an error if the poller stopped because of a failed cycle.
    pub async fn run(self) -> Result<()> {
        let result = self.poller.start().await;

        // Background tasks listen on the poller's shutdown channel; make sure
        // they see it even when the poller stopped on its own.
        self.handle.close();
        self.task_manager.shutdown().await;

        info!("All tasks shut down.");
        result.map_err(Into::into)
    }
}

/// Builder for the main application.
///
/// Separates constructing the components from running them, and lets tests
/// replace the weather source and the senders.
pub struct AppBuilder {
    config: Config,
    source_override: Option<Arc<dyn WeatherSource>>,
    senders_override: Option<Vec<Arc<dyn Sender>>>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            source_override: None,
            senders_override: None,
        }
    }

    /// Overrides the weather source for testing.
    pub fn source_override(mut self, source: Arc<dyn WeatherSource>) -> Self {
        self.source_override = Some(source);
        self
    }

    /// Overrides the configured senders for testing.
    pub fn senders_override(mut self, senders: Vec<Arc<dyn Sender>>) -> Self {
        self.senders_override = Some(senders);
        self
    }

    /// Builds all application components, returning a runnable `App`.
    ///
    /// A change on `shutdown_rx` closes the poller.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        config.validate()?;

        // =========================================================================
        // 1. Weather source and senders
        // =========================================================================
        let source = match self.source_override {
            Some(source) => source,
            None => {
                let client = OpenMeteoClient::new(&config.weather)?;
                debug!(url = client.url(), "Initializing forecast client");
                Arc::new(client) as Arc<dyn WeatherSource>
            }
        };

        let senders = match self.senders_override {
            Some(senders) => senders,
            None => senders::from_config(&config.senders)?,
        };
        if senders.is_empty() {
            warn!("No senders configured; forecasts will only be logged.");
        }

        // =========================================================================
        // 2. Metrics, poller and task manager
        // =========================================================================
        // The recorder has to be in place before `Metrics::new` registers its handles.
        let recorder = if config.metrics.log_metrics {
            match LoggingRecorder::install() {
                Ok(recorder) => Some(recorder),
                Err(e) => {
                    warn!(error = %e, "Metrics logging disabled.");
                    None
                }
            }
        } else {
            None
        };

        let metrics = Arc::new(Metrics::new());
        let poller = Poller::new(
            source,
            senders,
            config.poller.interval(),
            config.poller.failure_policy,
            metrics,
        );
        let handle = poller.handle();
        let task_manager = TaskManager::new(handle.subscribe());

        if let Some(recorder) = recorder {
            let interval = Duration::from_secs(config.metrics.log_interval_seconds);
            recorder.spawn_reporter(interval, &task_manager);
        }

        // =========================================================================
        // 3. Forward the external shutdown signal to the poller
        // =========================================================================
        let forward_handle = handle.clone();
        let mut external_rx = shutdown_rx;
        let mut internal_rx = handle.subscribe();
        task_manager.spawn("ShutdownForwarder", async move {
            tokio::select! {
                res = external_rx.changed() => {
                    if res.is_ok() {
                        info!("Shutdown signal received. Closing the poller...");
                        forward_handle.close();
                    }
                }
                _ = internal_rx.changed() => {}
            }
        });

        info!(
            interval_ms = config.poller.interval_ms,
            "WeatherWatch initialized successfully. Polling for forecasts..."
        );

        Ok(App {
            poller,
            handle,
            task_manager,
        })
    }
}
