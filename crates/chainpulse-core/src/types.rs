//! Canonical payload types, one per feed schema.
//!
//! Payloads are what normalizers produce and what subscribers consume.
//! They are plain data: producing the same raw event twice yields
//! identical payloads.

use serde::{Deserialize, Serialize};

/// An Ethereum block header, reduced to the fields the pipeline consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block number.
    pub number: u64,
    /// Block hash, 0x-prefixed.
    pub hash: String,
    /// Block timestamp in seconds.
    pub timestamp: u64,
    /// Miner address, 0x-prefixed.
    pub miner: String,
    /// Gas used by the block.
    pub gas_used: u64,
    /// Gas limit of the block.
    pub gas_limit: u64,
}

/// A single ETH/USD mark-price tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EthPrice {
    /// Price in USD.
    pub price: f64,
}

/// A raw gas-price tick. Tiers are denominated in Gwei.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasTick {
    pub rapid: f64,
    pub fast: f64,
    pub standard: f64,
    pub slow: f64,
    /// Tick timestamp in milliseconds.
    pub timestamp: u64,
}

/// Derived gas price of a plain transfer. Tiers are denominated in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasPrice {
    pub rapid: f64,
    pub fast: f64,
    pub standard: f64,
    pub slow: f64,
    /// Timestamp of the originating tick in milliseconds.
    pub timestamp: u64,
}

/// A mark-price tick for one currency, fanned out from the exchange stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkPrice {
    /// Base currency, e.g. "BTC".
    pub currency: String,
    /// Mark price in USD.
    pub price: f64,
}

/// Derived per-block miner revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinerReward {
    /// Block number.
    pub number: u64,
    /// Block timestamp in seconds.
    pub timestamp: u64,
    /// Miner address, 0x-prefixed.
    pub miner: String,
    /// Raw block reward in wei.
    pub reward: u64,
    /// Block reward converted to USD at the latest ETH price.
    pub reward_usd: f64,
}

/// Aggregate market metrics, flattened from the provider's USD quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalMetrics {
    pub active_cryptocurrencies: u64,
    pub active_exchanges: u64,
    pub btc_dominance: f64,
    pub eth_dominance: f64,
    pub total_market_cap: f64,
    pub total_volume_24h: f64,
    pub altcoin_market_cap: f64,
    pub altcoin_volume_24h: f64,
    pub defi_market_cap: f64,
    pub defi_volume_24h: f64,
    pub stablecoin_market_cap: f64,
    pub stablecoin_volume_24h: f64,
    pub derivatives_volume_24h: f64,
    /// Provider's last-updated time in milliseconds.
    pub timestamp: u64,
}

/// Canonical message payload. One variant per topic schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    BlockHeader(BlockHeader),
    EthPrice(EthPrice),
    GasTick(GasTick),
    GasPrice(GasPrice),
    MarkPrice(MarkPrice),
    MinerReward(MinerReward),
    GlobalMetrics(GlobalMetrics),
}

impl Payload {
    /// Schema name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BlockHeader(_) => "block_header",
            Self::EthPrice(_) => "eth_price",
            Self::GasTick(_) => "gas_tick",
            Self::GasPrice(_) => "gas_price",
            Self::MarkPrice(_) => "mark_price",
            Self::MinerReward(_) => "miner_reward",
            Self::GlobalMetrics(_) => "global_metrics",
        }
    }

    pub fn as_block_header(&self) -> Option<&BlockHeader> {
        match self {
            Self::BlockHeader(header) => Some(header),
            _ => None,
        }
    }

    pub fn as_eth_price(&self) -> Option<&EthPrice> {
        match self {
            Self::EthPrice(price) => Some(price),
            _ => None,
        }
    }

    pub fn as_gas_tick(&self) -> Option<&GasTick> {
        match self {
            Self::GasTick(tick) => Some(tick),
            _ => None,
        }
    }
}
