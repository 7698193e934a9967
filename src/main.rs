//! WeatherWatch - periodic weather forecast poller
//!
//! Fetches a forecast on a fixed interval and forwards it to every configured
//! notification channel until Ctrl-C is pressed.

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use weatherwatch::{
    app::App,
    cli::Cli,
    config::{Config, SenderConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        // Logging is not set up yet; use a default subscriber for this error.
        tracing_subscriber::fmt().init();
        error!("Failed to load configuration: {:#}", err);
        std::process::exit(1);
    });

    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("WeatherWatch starting up...");
    log_configuration(&config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let app = App::builder(config).build(shutdown_rx).await?;

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, initiating graceful shutdown...");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    if let Err(e) = app.run().await {
        error!("WeatherWatch stopped with an error: {:#}", e);
        return Err(e);
    }

    info!("WeatherWatch has shut down.");
    Ok(())
}

fn log_configuration(config: &Config) {
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Poll Interval: {}ms", config.poller.interval_ms);
    info!("Failure Policy: {}", config.poller.failure_policy);
    info!("Forecast Endpoint: {}", config.weather.endpoint);
    info!(
        "Location: {:.2}, {:.2}",
        config.weather.latitude, config.weather.longitude
    );
    info!("Hourly Series: {}", config.weather.hourly.join(", "));
    info!("Fetch Timeout: {}ms", config.weather.timeout_ms);
    info!(
        "Log Metrics: {}",
        if config.metrics.log_metrics {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    if config.senders.is_empty() {
        info!("Senders: None");
    }
    for sender in &config.senders {
        match sender {
            SenderConfig::Sms { number } => info!("Sender: sms ({})", number),
            SenderConfig::Email { address } => info!("Sender: email ({})", address),
            SenderConfig::Webhook { url, .. } => info!("Sender: webhook ({})", url),
        }
    }
    info!("-------------------------------------------------------");
}
