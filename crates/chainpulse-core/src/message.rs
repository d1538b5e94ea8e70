//! The canonical bus envelope.

use crate::topic::Topic;
use crate::types::Payload;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A message published on the bus.
///
/// Messages are ephemeral: produced by an ingestor or joiner, delivered to
/// zero or more current subscribers, then discarded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Routing topic.
    pub topic: Topic,
    /// Feed-specific payload.
    pub payload: Payload,
    /// Wall-clock time the message was published.
    pub produced_at: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(topic: Topic, payload: Payload) -> Self {
        Self {
            topic,
            payload,
            produced_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::TOPIC_ETH_PRICE;
    use crate::types::EthPrice;

    #[test]
    fn test_message_carries_topic_and_payload() {
        let msg = Message::new(TOPIC_ETH_PRICE, Payload::EthPrice(EthPrice { price: 1800.0 }));
        assert_eq!(msg.topic, TOPIC_ETH_PRICE);
        assert_eq!(msg.payload.as_eth_price().unwrap().price, 1800.0);
    }
}
