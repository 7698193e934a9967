//! SMS channel. There is no SMS gateway integration; the sender only logs the
//! delivery.

use crate::core::{Sender, WeatherRecord};
use async_trait::async_trait;
use tracing::info;

/// Sends weather reports to a phone number.
#[derive(Debug, Clone)]
pub struct SmsSender {
    number: String,
}

impl SmsSender {
    pub fn new(number: String) -> Self {
        Self { number }
    }

    pub fn number(&self) -> &str {
        &self.number
    }
}

#[async_trait]
impl Sender for SmsSender {
    fn name(&self) -> &str {
        "sms"
    }

    async fn send(&self, record: &WeatherRecord) -> anyhow::Result<()> {
        info!(
            number = %self.number,
            elevation = record.elevation,
            "Sending weather to number"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_sms_sender_logs_delivery() {
        let sender = SmsSender::new("719".to_string());
        assert_eq!(sender.number(), "719");

        let result = sender.send(&WeatherRecord::default()).await;

        assert!(result.is_ok());
        assert!(logs_contain("Sending weather to number"));
        assert!(logs_contain("number=719"));
    }
}
