//! A sender that posts weather reports to an HTTP webhook.

use crate::core::{Sender, WeatherRecord};
use crate::formatting::TextFormatter;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Posts `{"text": <summary>, "record": <record>}` to a webhook URL.
///
/// The `text` field makes the payload directly usable with chat incoming
/// webhooks; `record` carries the full decoded forecast.
pub struct WebhookSender {
    client: reqwest::Client,
    webhook_url: String,
    formatter: Box<dyn TextFormatter>,
}

impl WebhookSender {
    /// Creates a new `WebhookSender`.
    pub fn new(
        webhook_url: String,
        formatter: Box<dyn TextFormatter>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            webhook_url,
            formatter,
        })
    }
}

#[async_trait]
impl Sender for WebhookSender {
    fn name(&self) -> &str {
        "webhook"
    }

    #[instrument(skip(self, record), fields(url = %self.webhook_url))]
    async fn send(&self, record: &WeatherRecord) -> anyhow::Result<()> {
        let payload = json!({
            "text": self.formatter.format_record(record),
            "record": record,
        });

        let response = match self.client.post(&self.webhook_url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "HTTP request to webhook failed");
                return Err(e.into());
            }
        };

        let status = response.status();
        if status.is_success() {
            info!("Successfully sent weather report to webhook.");
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                body = %text,
                "Failed to send webhook notification"
            );
            anyhow::bail!(
                "Failed to send webhook notification: status {}, body: {}",
                status,
                text
            );
        }
    }
}
