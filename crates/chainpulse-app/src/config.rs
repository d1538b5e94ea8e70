//! Application configuration.
//!
//! Endpoints and tuning live in a TOML file with serde defaults; API
//! keys come from the environment and are required only by the
//! pipelines that use them.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Per-topic channel capacity.
    #[serde(default = "default_bus_capacity")]
    pub capacity: usize,
}

fn default_bus_capacity() -> usize {
    1024
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: default_bus_capacity(),
        }
    }
}

/// Streaming feed endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    /// Full-node WebSocket endpoint for header subscriptions.
    #[serde(default = "default_full_node_ws")]
    pub full_node_ws: String,
    /// Gas-price stream endpoint.
    #[serde(default = "default_gas_ws")]
    pub gas_ws: String,
    /// ETH/USD mark-price stream endpoint.
    #[serde(default = "default_eth_price_ws")]
    pub eth_price_ws: String,
    /// All-symbols mark-price stream endpoint.
    #[serde(default = "default_mark_price_ws")]
    pub mark_price_ws: String,
    /// Maximum reconnection attempts per stream (0 = infinite).
    #[serde(default)]
    pub max_reconnect_attempts: u32,
}

fn default_full_node_ws() -> String {
    "ws://localhost:8546".to_string()
}

fn default_gas_ws() -> String {
    "wss://www.gasnow.org/ws".to_string()
}

fn default_eth_price_ws() -> String {
    "wss://fstream.binance.com/ws/ethusdt@markPrice".to_string()
}

fn default_mark_price_ws() -> String {
    "wss://fstream.binance.com/ws/!markPrice@arr".to_string()
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            full_node_ws: default_full_node_ws(),
            gas_ws: default_gas_ws(),
            eth_price_ws: default_eth_price_ws(),
            mark_price_ws: default_mark_price_ws(),
            max_reconnect_attempts: 0,
        }
    }
}

/// Global-metrics poller configuration. Key comes from `CMC_API_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSection {
    #[serde(default = "default_metrics_url")]
    pub url: String,
    /// Poll interval in seconds.
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

fn default_metrics_url() -> String {
    "https://pro-api.coinmarketcap.com/v1/global-metrics/quotes/latest".to_string()
}

fn default_metrics_interval_secs() -> u64 {
    300
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            url: default_metrics_url(),
            interval_secs: default_metrics_interval_secs(),
        }
    }
}

/// Block-reward lookup configuration. Key comes from `ETHERSCAN_API_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupSection {
    #[serde(default = "default_lookup_base_url")]
    pub base_url: String,
    /// Attempts per lookup.
    #[serde(default = "default_lookup_max_attempts")]
    pub max_attempts: u32,
    /// Delay before each attempt, in seconds.
    #[serde(default = "default_lookup_delay_secs")]
    pub delay_secs: u64,
}

fn default_lookup_base_url() -> String {
    "https://api.etherscan.io/api".to_string()
}

fn default_lookup_max_attempts() -> u32 {
    3
}

fn default_lookup_delay_secs() -> u64 {
    5
}

impl Default for LookupSection {
    fn default() -> Self {
        Self {
            base_url: default_lookup_base_url(),
            max_attempts: default_lookup_max_attempts(),
            delay_secs: default_lookup_delay_secs(),
        }
    }
}

/// Join tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinSection {
    /// Gas consumed by the reference transfer.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: f64,
}

fn default_gas_limit() -> f64 {
    21_000.0
}

impl Default for JoinSection {
    fn default() -> Self {
        Self {
            gas_limit: default_gas_limit(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub metrics: MetricsSection,
    #[serde(default)]
    pub lookup: LookupSection,
    #[serde(default)]
    pub join: JoinSection,
}

impl AppConfig {
    /// Load configuration from file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Metrics poll interval.
    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.metrics.interval_secs)
    }

    /// Delay between lookup attempts.
    pub fn lookup_delay(&self) -> Duration {
        Duration::from_secs(self.lookup.delay_secs)
    }
}

/// Read a required secret from the environment.
///
/// Missing secrets are fatal at startup, before any subscription is
/// established.
pub fn require_env(name: &str) -> AppResult<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Config(format!("The {name} environment variable is empty")))
}
