//! Pipeline wiring.
//!
//! Builds one in-process bus and composes clients, ingestors, trackers
//! and joiners onto it. Concurrency across pipelines comes from running
//! one pipeline per process (the deployment topology); `All` exists for
//! single-process setups.

use crate::config::{require_env, AppConfig};
use crate::error::AppResult;
use chainpulse_bus::{Bus, LatestValueCache};
use chainpulse_core::topic::{
    TOPIC_ETH_BLOCK_HEADER, TOPIC_ETH_GAS_PRICE, TOPIC_ETH_GAS_TICK, TOPIC_ETH_MINER_REVENUE,
    TOPIC_ETH_PRICE, TOPIC_MARK_PRICE,
};
use chainpulse_core::Topic;
use chainpulse_feed::ingestor::Normalizer;
use chainpulse_feed::{
    parse_block_header_event, parse_eth_price_tick, parse_gas_tick, parse_mark_price_events,
    FeedIngestor, GlobalMetricsPoller, MetricsConfig,
};
use chainpulse_join::{
    track_latest, GasUsdJoin, JoinContext, MinerRevenueJoin, StreamJoiner,
};
use chainpulse_lookup::{RetryPolicy, RewardClient};
use chainpulse_ws::{StreamClient, StreamConfig};
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Inbound frame buffer between a stream client and its ingestor.
const INBOUND_BUFFER: usize = 256;

/// Header subscription request sent to the full node.
const NEW_HEADS_REQUEST: &str =
    r#"{"jsonrpc":"2.0","id":1,"method":"eth_subscribe","params":["newHeads"]}"#;

/// Which pipeline this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    BlockHeader,
    EthPrice,
    GasPrice,
    MarkPrice,
    GlobalMetrics,
    MinerRevenue,
    All,
}

impl Pipeline {
    fn runs_block_header_feed(self) -> bool {
        matches!(self, Self::BlockHeader | Self::MinerRevenue | Self::All)
    }

    fn runs_eth_price_feed(self) -> bool {
        matches!(
            self,
            Self::EthPrice | Self::GasPrice | Self::MinerRevenue | Self::All
        )
    }

    fn runs_gas_feed(self) -> bool {
        matches!(self, Self::GasPrice | Self::All)
    }

    fn runs_mark_price_feed(self) -> bool {
        matches!(self, Self::MarkPrice | Self::All)
    }

    fn runs_global_metrics(self) -> bool {
        matches!(self, Self::GlobalMetrics | Self::All)
    }

    fn runs_revenue_join(self) -> bool {
        matches!(self, Self::MinerRevenue | Self::All)
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    bus: Arc<Bus>,
    cache: Arc<LatestValueCache>,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        let bus = Arc::new(Bus::new(config.bus.capacity));
        let cache = Arc::new(LatestValueCache::new());
        Self { config, bus, cache }
    }

    /// Wire up the requested pipeline and run until its tasks exit.
    ///
    /// Required secrets are resolved before anything is spawned, so a
    /// missing key aborts startup before any subscription exists.
    pub async fn run(&self, pipeline: Pipeline) -> AppResult<()> {
        info!(?pipeline, "Wiring pipeline");

        let mut tasks: Vec<JoinHandle<()>> = Vec::new();
        let mut aux_topics: Vec<Topic> = Vec::new();

        if pipeline.runs_block_header_feed() {
            let config = self
                .stream_config(&self.config.feeds.full_node_ws)
                .with_init_request(NEW_HEADS_REQUEST);
            tasks.extend(self.spawn_stream_feed(
                config,
                TOPIC_ETH_BLOCK_HEADER,
                parse_block_header_event,
            ));
        }

        if pipeline.runs_eth_price_feed() {
            let config = self.stream_config(&self.config.feeds.eth_price_ws);
            tasks.extend(self.spawn_stream_feed(config, TOPIC_ETH_PRICE, parse_eth_price_tick));
        }

        if pipeline.runs_gas_feed() {
            let config = self.stream_config(&self.config.feeds.gas_ws);
            tasks.extend(self.spawn_stream_feed(config, TOPIC_ETH_GAS_TICK, parse_gas_tick));

            aux_topics.push(TOPIC_ETH_PRICE);
            tasks.push(self.spawn_gas_join());
        }

        if pipeline.runs_mark_price_feed() {
            let config = self.stream_config(&self.config.feeds.mark_price_ws);
            tasks.extend(self.spawn_stream_feed(config, TOPIC_MARK_PRICE, parse_mark_price_events));
        }

        if pipeline.runs_global_metrics() {
            tasks.push(self.spawn_metrics_poller()?);
        }

        if pipeline.runs_revenue_join() {
            if !aux_topics.contains(&TOPIC_ETH_PRICE) {
                aux_topics.push(TOPIC_ETH_PRICE);
            }
            tasks.push(self.spawn_revenue_join()?);
        }

        // One tracker per auxiliary topic keeps the cache single-writer.
        for topic in aux_topics {
            tasks.push(tokio::spawn(track_latest(
                self.bus.clone(),
                self.cache.clone(),
                topic,
            )));
        }

        info!(tasks = tasks.len(), "Pipeline running");
        join_all(tasks).await;
        Ok(())
    }

    fn stream_config(&self, url: &str) -> StreamConfig {
        let mut config = StreamConfig::for_url(url);
        config.max_reconnect_attempts = self.config.feeds.max_reconnect_attempts;
        config
    }

    /// Spawn a stream client and the ingestor consuming it.
    fn spawn_stream_feed(
        &self,
        config: StreamConfig,
        topic: Topic,
        normalize: Normalizer,
    ) -> Vec<JoinHandle<()>> {
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);

        let client = StreamClient::new(config, inbound_tx);
        let client_task = tokio::spawn(async move {
            if let Err(e) = client.run().await {
                error!(error = %e, "Stream client exited");
            }
        });

        let ingestor = FeedIngestor::new(topic, normalize, self.bus.clone());
        let ingestor_task = tokio::spawn(async move { ingestor.run(inbound_rx).await });

        vec![client_task, ingestor_task]
    }

    fn spawn_gas_join(&self) -> JoinHandle<()> {
        let joiner = StreamJoiner::new(
            JoinContext {
                primary: TOPIC_ETH_GAS_TICK,
                auxiliaries: vec![TOPIC_ETH_PRICE],
                result: TOPIC_ETH_GAS_PRICE,
            },
            GasUsdJoin::new(self.config.join.gas_limit),
            self.bus.clone(),
            self.cache.clone(),
        );
        tokio::spawn(async move { joiner.run().await })
    }

    fn spawn_revenue_join(&self) -> AppResult<JoinHandle<()>> {
        let api_key = require_env("ETHERSCAN_API_KEY")?;
        let policy = RetryPolicy::new(self.config.lookup.max_attempts, self.config.lookup_delay());
        let client = RewardClient::new(&self.config.lookup.base_url, api_key, policy)?;

        let joiner = StreamJoiner::new(
            JoinContext {
                primary: TOPIC_ETH_BLOCK_HEADER,
                auxiliaries: vec![TOPIC_ETH_PRICE],
                result: TOPIC_ETH_MINER_REVENUE,
            },
            MinerRevenueJoin::new(client),
            self.bus.clone(),
            self.cache.clone(),
        );
        Ok(tokio::spawn(async move { joiner.run().await }))
    }

    fn spawn_metrics_poller(&self) -> AppResult<JoinHandle<()>> {
        let api_key = require_env("CMC_API_KEY")?;
        let poller = GlobalMetricsPoller::new(
            MetricsConfig {
                url: self.config.metrics.url.clone(),
                api_key,
                interval: self.config.metrics_interval(),
            },
            self.bus.clone(),
        )?;
        Ok(tokio::spawn(async move { poller.run().await }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_composition() {
        assert!(Pipeline::GasPrice.runs_eth_price_feed());
        assert!(Pipeline::GasPrice.runs_gas_feed());
        assert!(!Pipeline::GasPrice.runs_block_header_feed());

        assert!(Pipeline::MinerRevenue.runs_block_header_feed());
        assert!(Pipeline::MinerRevenue.runs_eth_price_feed());
        assert!(!Pipeline::MinerRevenue.runs_gas_feed());

        assert!(Pipeline::BlockHeader.runs_block_header_feed());
        assert!(!Pipeline::BlockHeader.runs_eth_price_feed());

        assert!(Pipeline::All.runs_block_header_feed());
        assert!(Pipeline::All.runs_eth_price_feed());
        assert!(Pipeline::All.runs_gas_feed());
        assert!(Pipeline::All.runs_mark_price_feed());
        assert!(Pipeline::All.runs_global_metrics());
        assert!(Pipeline::All.runs_revenue_join());
    }

    #[test]
    fn test_missing_secret_fails_before_spawning() {
        std::env::remove_var("ETHERSCAN_API_KEY");
        let app = Application::new(AppConfig::default());
        assert!(app.spawn_revenue_join().is_err());
    }
}
