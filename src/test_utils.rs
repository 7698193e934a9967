//! Fakes for exercising the poller without a network.

use crate::core::{Sender, WeatherRecord, WeatherSource};
use crate::fetcher::{parse_record, FetchError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Shared delivery log: `(sender name, record)` in delivery order.
pub type DeliveryLog = Arc<Mutex<Vec<(String, WeatherRecord)>>>;

/// A weather source that replays scripted responses.
///
/// Each scripted `Err(body)` is decoded with `parse_record`, so the error it
/// produces is a real `FetchError::Decode`. Once the script runs out, the
/// fallback response is returned forever.
pub struct FakeWeatherSource {
    script: Mutex<VecDeque<Result<WeatherRecord, String>>>,
    fallback: Result<WeatherRecord, String>,
    calls: AtomicUsize,
}

impl FakeWeatherSource {
    /// Always returns `record`.
    pub fn always(record: WeatherRecord) -> Self {
        Self::sequence_then(vec![], Ok(record))
    }

    /// Always fails with a decode error.
    pub fn always_failing() -> Self {
        Self::sequence_then(vec![], Err("not json".to_string()))
    }

    /// Replays `script`, then repeats its last entry.
    pub fn sequence(script: Vec<Result<WeatherRecord, String>>) -> Self {
        let fallback = script
            .last()
            .cloned()
            .unwrap_or_else(|| Ok(WeatherRecord::default()));
        Self::sequence_then(script, fallback)
    }

    fn sequence_then(
        script: Vec<Result<WeatherRecord, String>>,
        fallback: Result<WeatherRecord, String>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for FakeWeatherSource {
    async fn fetch(&self) -> Result<WeatherRecord, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match next {
            Ok(record) => Ok(record),
            Err(body) => parse_record(&body),
        }
    }
}

/// A sender that records every record it receives.
#[derive(Clone)]
pub struct RecordingSender {
    name: String,
    log: DeliveryLog,
    fail: bool,
    notifier: Arc<Notify>,
}

impl RecordingSender {
    pub fn new(name: &str) -> Self {
        Self::with_log(name, Self::shared_log())
    }

    /// Records into a log shared with other senders, to observe ordering.
    pub fn with_log(name: &str, log: DeliveryLog) -> Self {
        Self {
            name: name.to_string(),
            log,
            fail: false,
            notifier: Arc::new(Notify::new()),
        }
    }

    /// Records the record and then reports a failure.
    pub fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    pub fn shared_log() -> DeliveryLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    /// Records received by this sender, in order.
    pub fn received(&self) -> Vec<WeatherRecord> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == self.name)
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Waits until this sender has received at least `count` records.
    pub async fn wait_for_count(&self, count: usize, timeout: std::time::Duration) {
        let wait = async {
            loop {
                let notified = self.notifier.notified();
                if self.received().len() >= count {
                    break;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .expect("Timed out waiting for deliveries");
    }
}

#[async_trait]
impl Sender for RecordingSender {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, record: &WeatherRecord) -> anyhow::Result<()> {
        self.log
            .lock()
            .unwrap()
            .push((self.name.clone(), record.clone()));
        self.notifier.notify_waiters();
        if self.fail {
            anyhow::bail!("{} is configured to fail", self.name);
        }
        Ok(())
    }
}
