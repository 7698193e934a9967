//! Email channel. No mail transport is wired in; the sender only logs the
//! delivery.

use crate::core::{Sender, WeatherRecord};
use async_trait::async_trait;
use tracing::info;

/// Sends weather reports to a mail address.
#[derive(Debug, Clone)]
pub struct EmailSender {
    address: String,
}

impl EmailSender {
    pub fn new(address: String) -> Self {
        Self { address }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl Sender for EmailSender {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, record: &WeatherRecord) -> anyhow::Result<()> {
        info!(
            address = %self.address,
            elevation = record.elevation,
            series = record.hourly.len(),
            "Sending weather by email"
        );
        Ok(())
    }
}
