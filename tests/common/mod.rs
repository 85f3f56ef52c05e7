// Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use vulnscan_rs::config::ProviderSettings;
use vulnscan_rs::core::poll::{PollConfig, Sleeper};
use vulnscan_rs::core::scanner::http::build_client;

/// Returns immediately so poll loops run at full speed.
pub struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

pub fn no_sleep() -> Arc<dyn Sleeper> {
    Arc::new(NoSleep)
}

pub fn client() -> Client {
    build_client(Duration::from_secs(5)).unwrap()
}

pub fn settings(base_url: &str, api_key: Option<&str>) -> ProviderSettings {
    ProviderSettings {
        api_key: api_key.map(str::to_string),
        base_url: Some(base_url.to_string()),
    }
}

pub fn fast_poll(max_attempts: u32) -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(1),
        max_attempts,
        backoff_multiplier: 1.0,
    }
}
