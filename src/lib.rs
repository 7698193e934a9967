//! WeatherWatch - a periodic weather forecast poller.
//!
//! Fetches an Open-Meteo forecast on a fixed interval and hands every decoded
//! record to a list of notification senders, until asked to shut down.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod fetcher;
pub mod formatting;
pub mod internal_metrics;
pub mod poller;
pub mod senders;
pub mod task_manager;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export core types for convenience
pub use core::*;
