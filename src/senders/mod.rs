//! Notification channels that deliver weather records.
//!
//! Every channel implements the `Sender` trait from `core`. The poller holds
//! them as an ordered list of trait objects and delivers each record to all of
//! them in the order they were configured.

pub mod email;
pub mod sms;
pub mod webhook;

pub use email::EmailSender;
pub use sms::SmsSender;
pub use webhook::WebhookSender;

use crate::config::SenderConfig;
use crate::core::Sender;
use crate::formatting::SummaryFormatter;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Builds the configured senders, preserving their order.
pub fn from_config(configs: &[SenderConfig]) -> Result<Vec<Arc<dyn Sender>>> {
    configs
        .iter()
        .map(|config| -> Result<Arc<dyn Sender>> {
            let sender: Arc<dyn Sender> = match config {
                SenderConfig::Sms { number } => Arc::new(SmsSender::new(number.clone())),
                SenderConfig::Email { address } => Arc::new(EmailSender::new(address.clone())),
                SenderConfig::Webhook { url, timeout_ms } => Arc::new(WebhookSender::new(
                    url.clone(),
                    Box::new(SummaryFormatter),
                    Duration::from_millis(*timeout_ms),
                )?),
            };
            Ok(sender)
        })
        .collect()
}
