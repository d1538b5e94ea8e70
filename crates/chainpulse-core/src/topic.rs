//! Bus topic identifiers.
//!
//! Topics form a fixed, compile-time set. Routing on the bus is by topic
//! string equality; nothing creates topics dynamically.

use serde::Serialize;

/// Namespace prefix shared by every chainpulse topic.
pub const TOPIC_PREFIX: &str = "chainpulse";

/// A named channel on the bus.
///
/// Cheap to copy and compare; the inner string is the wire identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Topic(pub &'static str);

impl Topic {
    /// The wire identifier of this topic.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// New Ethereum block headers from the full node.
pub const TOPIC_ETH_BLOCK_HEADER: Topic = Topic("chainpulse:eth_block_header");

/// ETH/USD mark price ticks.
pub const TOPIC_ETH_PRICE: Topic = Topic("chainpulse:eth_price");

/// Raw gas-price ticks, tiers in Gwei. Input of the gas USD join.
pub const TOPIC_ETH_GAS_TICK: Topic = Topic("chainpulse:eth_gas_tick");

/// Derived gas price of a plain transfer, tiers in USD.
pub const TOPIC_ETH_GAS_PRICE: Topic = Topic("chainpulse:eth_gas_price");

/// Derived per-block miner revenue in ETH and USD.
pub const TOPIC_ETH_MINER_REVENUE: Topic = Topic("chainpulse:eth_miner_revenue");

/// Per-currency mark prices fanned out from the exchange stream.
pub const TOPIC_MARK_PRICE: Topic = Topic("chainpulse:mark_price");

/// Aggregate market metrics polled from the metrics provider.
pub const TOPIC_CMC_GLOBAL_METRICS: Topic = Topic("chainpulse:cmc_global_metrics");
