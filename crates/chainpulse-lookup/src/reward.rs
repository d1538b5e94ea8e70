//! Block-reward lookup client.
//!
//! Fetches the reward for a mined block from an explorer-style REST
//! endpoint. The streamed header does not carry the reward, so joiners
//! enrich headers through this client, under a retry policy.

use crate::error::{LookupError, LookupResult};
use crate::retry::{retry_with_policy, RetryPolicy};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw reward record for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReward {
    /// Block number.
    pub block_number: u64,
    /// Block timestamp in seconds.
    pub time_stamp: u64,
    /// Miner address, 0x-prefixed.
    pub block_miner: String,
    /// Block reward in wei.
    pub block_reward: u64,
}

/// Seam for reward lookups, so joiners can be exercised without a network.
pub trait RewardFetcher: Send + Sync {
    fn fetch_block_reward(
        &self,
        number: u64,
    ) -> impl Future<Output = LookupResult<BlockReward>> + Send;
}

/// REST client for block-reward lookups.
pub struct RewardClient {
    client: Client,
    base_url: String,
    api_key: String,
    policy: RetryPolicy,
}

impl RewardClient {
    /// Create a new reward client.
    ///
    /// # Arguments
    /// * `base_url` - explorer API root (e.g. "https://api.etherscan.io/api")
    /// * `api_key` - explorer API key
    /// * `policy` - retry policy applied per lookup
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        policy: RetryPolicy,
    ) -> LookupResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| LookupError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            policy,
        })
    }

    async fn attempt(&self, number: u64) -> LookupResult<Option<BlockReward>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("module", "block"),
                ("action", "getblockreward"),
                ("blockno", &number.to_string()),
                ("apikey", &self.api_key),
            ])
            .send()
            .await
            .map_err(|e| LookupError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::HttpClient(format!("HTTP {status}")));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LookupError::MalformedResponse(format!("Invalid JSON: {e}")))?;

        parse_reward_body(&body)
    }
}

impl RewardFetcher for RewardClient {
    async fn fetch_block_reward(&self, number: u64) -> LookupResult<BlockReward> {
        debug!(block = number, "Fetching block reward");
        retry_with_policy(self.policy, "block_reward", || self.attempt(number)).await
    }
}

/// Extract the reward record from a response body.
///
/// A `result.blockNumber` field is the success marker; a body without it
/// (rate-limit notices, pending blocks) yields `Ok(None)`, which the
/// retry executor treats as a retryable miss.
fn parse_reward_body(body: &serde_json::Value) -> LookupResult<Option<BlockReward>> {
    let result = &body["result"];
    let Some(block_number) = result["blockNumber"].as_str() else {
        return Ok(None);
    };

    let parse_u64 = |field: &str| -> LookupResult<u64> {
        result[field]
            .as_str()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| LookupError::MalformedResponse(format!("Bad field: {field}")))
    };

    let block_miner = result["blockMiner"]
        .as_str()
        .ok_or_else(|| LookupError::MalformedResponse("Bad field: blockMiner".to_string()))?
        .to_string();

    Ok(Some(BlockReward {
        block_number: block_number
            .parse()
            .map_err(|_| LookupError::MalformedResponse("Bad field: blockNumber".to_string()))?,
        time_stamp: parse_u64("timeStamp")?,
        block_miner,
        block_reward: parse_u64("blockReward")?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_success_body() {
        let body = json!({
            "status": "1",
            "message": "OK",
            "result": {
                "blockNumber": "12345678",
                "timeStamp": "1620000000",
                "blockMiner": "0xabc",
                "blockReward": "2000000000000000000",
                "uncles": []
            }
        });

        let reward = parse_reward_body(&body).unwrap().unwrap();
        assert_eq!(reward.block_number, 12_345_678);
        assert_eq!(reward.time_stamp, 1_620_000_000);
        assert_eq!(reward.block_miner, "0xabc");
        assert_eq!(reward.block_reward, 2_000_000_000_000_000_000);
    }

    #[test]
    fn test_missing_marker_is_not_an_error() {
        // Rate-limit style body: result is a plain string.
        let body = json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Max rate limit reached"
        });
        assert!(parse_reward_body(&body).unwrap().is_none());
    }

    #[test]
    fn test_malformed_numeric_field() {
        let body = json!({
            "result": {
                "blockNumber": "12345678",
                "timeStamp": "not-a-number",
                "blockMiner": "0xabc",
                "blockReward": "1"
            }
        });
        assert!(matches!(
            parse_reward_body(&body),
            Err(LookupError::MalformedResponse(_))
        ));
    }
}
