//! Block header -> miner revenue join.
//!
//! The streamed header carries no reward, so each header triggers a
//! bounded-retry reward lookup before the USD conversion. An exhausted
//! lookup skips that block; the joiner keeps processing later blocks.

use crate::error::{JoinError, JoinResult};
use crate::joiner::{unexpected, AuxValues, Join};
use chainpulse_core::topic::TOPIC_ETH_PRICE;
use chainpulse_core::types::{MinerReward, Payload};
use chainpulse_core::units::wei_to_eth;
use chainpulse_core::Message;
use chainpulse_lookup::RewardFetcher;

/// Join function for the miner revenue pipeline.
pub struct MinerRevenueJoin<F: RewardFetcher> {
    fetcher: F,
}

impl<F: RewardFetcher> MinerRevenueJoin<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F: RewardFetcher> Join for MinerRevenueJoin<F> {
    async fn apply(&self, primary: &Message, aux: &AuxValues) -> JoinResult<Payload> {
        let header = primary
            .payload
            .as_block_header()
            .ok_or_else(|| unexpected(primary.topic, &primary.payload))?;
        let eth_price = aux
            .eth_price()
            .ok_or(JoinError::MissingAux(TOPIC_ETH_PRICE))?;

        let reward = self
            .fetcher
            .fetch_block_reward(header.number)
            .await
            .map_err(|source| JoinError::Lookup {
                block: header.number,
                source,
            })?;

        Ok(Payload::MinerReward(MinerReward {
            number: reward.block_number,
            timestamp: reward.time_stamp,
            miner: reward.block_miner.clone(),
            reward: reward.block_reward,
            reward_usd: wei_to_eth(reward.block_reward) * eth_price,
        }))
    }
}
