//! Gas tick -> USD join.
//!
//! Converts each Gwei-denominated gas tier into the USD cost of a plain
//! transfer at the latest ETH price.

use crate::error::{JoinError, JoinResult};
use crate::joiner::{unexpected, AuxValues, Join};
use chainpulse_core::topic::TOPIC_ETH_PRICE;
use chainpulse_core::types::{GasPrice, Payload};
use chainpulse_core::units::gwei_to_eth;
use chainpulse_core::Message;

/// Join function for the gas USD pipeline.
pub struct GasUsdJoin {
    /// Gas consumed by the reference transaction.
    gas_limit: f64,
}

impl GasUsdJoin {
    pub fn new(gas_limit: f64) -> Self {
        Self { gas_limit }
    }

    fn tier_usd(&self, gwei: f64, eth_price: f64) -> f64 {
        gwei_to_eth(gwei) * self.gas_limit * eth_price
    }
}

impl Join for GasUsdJoin {
    async fn apply(&self, primary: &Message, aux: &AuxValues) -> JoinResult<Payload> {
        let tick = primary
            .payload
            .as_gas_tick()
            .ok_or_else(|| unexpected(primary.topic, &primary.payload))?;
        let eth_price = aux
            .eth_price()
            .ok_or(JoinError::MissingAux(TOPIC_ETH_PRICE))?;

        Ok(Payload::GasPrice(GasPrice {
            rapid: self.tier_usd(tick.rapid, eth_price),
            fast: self.tier_usd(tick.fast, eth_price),
            standard: self.tier_usd(tick.standard, eth_price),
            slow: self.tier_usd(tick.slow, eth_price),
            timestamp: tick.timestamp,
        }))
    }
}
