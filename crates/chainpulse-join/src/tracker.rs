//! Latest-value tracker task.
//!
//! Bridges a bus topic into the cache: every message on the topic
//! overwrites the topic's slot. Wiring spawns exactly one tracker per
//! topic per process, which is what keeps the cache single-writer.

use chainpulse_bus::{Bus, LatestValueCache};
use chainpulse_core::Topic;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

/// Mirror the latest message on `topic` into the cache.
pub async fn track_latest(bus: Arc<Bus>, cache: Arc<LatestValueCache>, topic: Topic) {
    let mut rx = bus.subscribe(topic);
    info!(%topic, "Latest-value tracker started");

    loop {
        match rx.recv().await {
            Ok(msg) => {
                cache.update(topic, msg.payload);
            }
            Err(RecvError::Lagged(skipped)) => {
                // Only the newest value matters; lag just means the slot
                // skipped some intermediate overwrites.
                debug!(%topic, skipped, "Tracker lagged");
            }
            Err(RecvError::Closed) => {
                info!(%topic, "Topic closed, tracker exiting");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainpulse_core::topic::TOPIC_ETH_PRICE;
    use chainpulse_core::types::{EthPrice, Payload};
    use std::time::Duration;

    #[tokio::test]
    async fn test_tracker_mirrors_latest_value() {
        let bus = Arc::new(Bus::default());
        let cache = Arc::new(LatestValueCache::new());

        let _tracker = tokio::spawn(track_latest(bus.clone(), cache.clone(), TOPIC_ETH_PRICE));
        tokio::time::sleep(Duration::from_millis(10)).await;

        bus.publish(TOPIC_ETH_PRICE, Payload::EthPrice(EthPrice { price: 100.0 }));
        bus.publish(TOPIC_ETH_PRICE, Payload::EthPrice(EthPrice { price: 110.0 }));

        cache.wait_present(TOPIC_ETH_PRICE).await;
        // Drain both publishes before asserting on the final slot.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let (value, seq) = cache.read(TOPIC_ETH_PRICE).unwrap();
        assert_eq!(value, Payload::EthPrice(EthPrice { price: 110.0 }));
        assert_eq!(seq, 2);
    }
}
