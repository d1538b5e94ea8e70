//! In-process topic bus.
//!
//! One broadcast channel per topic. Delivery is at-most-once and
//! best-effort: late subscribers see nothing from before they subscribed,
//! and a subscriber that lags past the channel capacity loses the oldest
//! messages. Messages on one topic reach subscribers in publish order;
//! there is no cross-topic ordering.
//!
//! Independent `Bus` instances share no state. Cross-process delivery is
//! the transport's problem, not ours; within a process, topic string
//! equality determines routing.

use chainpulse_core::{Message, Payload, Topic};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::trace;

/// Default per-topic channel capacity.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Topic-addressed publish/subscribe bus.
pub struct Bus {
    channels: DashMap<Topic, broadcast::Sender<Message>>,
    capacity: usize,
}

impl Bus {
    /// Create a bus with the given per-topic channel capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, topic: Topic) -> broadcast::Sender<Message> {
        self.channels
            .entry(topic)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Publish a payload to every current subscriber of `topic`.
    ///
    /// Stamps `produced_at` and returns the number of subscribers that
    /// received the message. Zero subscribers is normal, not an error:
    /// the publisher never learns about, or fails because of, its
    /// consumers.
    pub fn publish(&self, topic: Topic, payload: Payload) -> usize {
        let msg = Message::new(topic, payload);
        match self.sender(topic).send(msg) {
            Ok(receivers) => {
                trace!(%topic, receivers, "published");
                receivers
            }
            Err(_) => {
                // No receivers subscribed yet.
                trace!(%topic, "published with no subscribers");
                0
            }
        }
    }

    /// Subscribe to `topic`.
    ///
    /// Registration takes effect before this returns: every publish after
    /// the call is visible to the returned receiver. Messages published
    /// before the call are not replayed.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Message> {
        self.sender(topic).subscribe()
    }

    /// Number of current subscribers of `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channels
            .get(&topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
