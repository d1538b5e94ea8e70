//! Global market metrics poller.
//!
//! The metrics provider has no streaming surface, so this feed is
//! periodic REST: fetch, normalize, publish. Fetch failures are reported
//! and the loop continues at the next tick.

use crate::error::{FeedError, FeedResult};
use crate::normalize::parse_global_metrics;
use chainpulse_bus::Bus;
use chainpulse_core::topic::TOPIC_CMC_GLOBAL_METRICS;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for metrics requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Metrics poller configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Endpoint URL for the latest global metrics.
    pub url: String,
    /// API key, sent as the provider's key header.
    pub api_key: String,
    /// Poll interval.
    pub interval: Duration,
}

/// Periodic feed of aggregate market metrics.
pub struct GlobalMetricsPoller {
    client: Client,
    config: MetricsConfig,
    bus: Arc<Bus>,
}

impl GlobalMetricsPoller {
    pub fn new(config: MetricsConfig, bus: Arc<Bus>) -> FeedResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| FeedError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            bus,
        })
    }

    /// Poll forever at the configured interval.
    pub async fn run(&self) {
        info!(url = %self.config.url, interval_secs = self.config.interval.as_secs(), "Metrics poller started");
        let mut interval = tokio::time::interval(self.config.interval);

        loop {
            interval.tick().await;

            match self.fetch_once().await {
                Ok(published) => {
                    debug!(receivers = published, "Metrics published");
                }
                Err(e) => {
                    warn!(error = %e, "Metrics fetch failed");
                }
            }
        }
    }

    /// One fetch-normalize-publish round.
    pub async fn fetch_once(&self) -> FeedResult<usize> {
        let response = self
            .client
            .get(&self.config.url)
            .header("X-CMC_PRO_API_KEY", &self.config.api_key)
            .send()
            .await
            .map_err(|e| FeedError::Http(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Http(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Http(format!("Failed to read body: {e}")))?;

        let mut receivers = 0;
        for payload in parse_global_metrics(&body)? {
            receivers = self.bus.publish(TOPIC_CMC_GLOBAL_METRICS, payload);
        }
        Ok(receivers)
    }
}
