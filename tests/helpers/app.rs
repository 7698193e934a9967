#![allow(dead_code)]
//! Test helpers for running the full application instance.

use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle, time::timeout};
use weatherwatch::{
    app::AppBuilder,
    config::Config,
    core::{Sender, WeatherSource},
    poller::PollerHandle,
};

/// Represents a running instance of the application for testing purposes.
#[derive(Debug)]
pub struct TestApp {
    pub shutdown_tx: watch::Sender<bool>,
    pub poller: PollerHandle,
    pub app_handle: Option<JoinHandle<Result<()>>>,
}

impl TestApp {
    /// Shuts down the application and waits for it to terminate.
    /// Fails if the application does not shut down within the specified timeout.
    pub async fn shutdown(mut self, timeout_duration: Duration) -> Result<()> {
        // The app may already have stopped and dropped its receiver.
        self.shutdown_tx.send_replace(true);
        self.wait(timeout_duration).await
    }

    /// Waits for the application to stop on its own.
    pub async fn wait(&mut self, timeout_duration: Duration) -> Result<()> {
        if let Some(handle) = self.app_handle.take() {
            match timeout(timeout_duration, handle).await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => Err(e.into()),
                Err(_) => Err(anyhow::anyhow!("App failed to shut down within the timeout")),
            }
        } else {
            Ok(())
        }
    }
}

/// A builder for creating `TestApp` instances with specific configurations.
pub struct TestAppBuilder {
    pub config: Config,
    source: Option<Arc<dyn WeatherSource>>,
    senders: Option<Vec<Arc<dyn Sender>>>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        // Nothing listens here; tests that need a forecast point at a mock server.
        config.weather.endpoint = "http://127.0.0.1:9/v1/forecast".to_string();
        config.weather.timeout_ms = 500;
        config.poller.interval_ms = 50;

        Self {
            config,
            source: None,
            senders: Some(vec![]),
        }
    }

    pub fn with_config_modifier(mut self, modifier: impl FnOnce(&mut Config)) -> Self {
        modifier(&mut self.config);
        self
    }

    pub fn with_source(mut self, source: Arc<dyn WeatherSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_senders(mut self, senders: Vec<Arc<dyn Sender>>) -> Self {
        self.senders = Some(senders);
        self
    }

    /// Uses the senders from the configuration instead of test doubles.
    pub fn with_configured_senders(mut self) -> Self {
        self.senders = None;
        self
    }

    /// Builds the application and runs it in the background.
    pub async fn start(self) -> Result<TestApp> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut builder = AppBuilder::new(self.config);
        if let Some(source) = self.source {
            builder = builder.source_override(source);
        }
        if let Some(senders) = self.senders {
            builder = builder.senders_override(senders);
        }

        let app = builder.build(shutdown_rx).await?;
        let poller = app.poller_handle();
        let app_handle = tokio::spawn(app.run());

        Ok(TestApp {
            shutdown_tx,
            poller,
            app_handle: Some(app_handle),
        })
    }
}
