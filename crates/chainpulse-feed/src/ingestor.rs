//! Normalize-and-publish loop.

use crate::error::FeedResult;
use chainpulse_bus::Bus;
use chainpulse_core::{Payload, Topic};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Normalizer signature: one raw event in, zero or more payloads out.
pub type Normalizer = fn(&str) -> FeedResult<Vec<Payload>>;

/// One ingestor per external feed.
///
/// Consumes raw events from the stream client's channel, normalizes each
/// with a pure feed-specific function, and publishes every resulting
/// payload to this ingestor's fixed topic. Exactly one canonical message
/// per relevant event, published once.
pub struct FeedIngestor {
    topic: Topic,
    normalize: Normalizer,
    bus: Arc<Bus>,
}

impl FeedIngestor {
    pub fn new(topic: Topic, normalize: Normalizer, bus: Arc<Bus>) -> Self {
        Self {
            topic,
            normalize,
            bus,
        }
    }

    /// Consume raw events until the inbound channel closes.
    ///
    /// A malformed event is dropped with a report; ingestion continues.
    /// The channel closing means the connection is gone for good: the
    /// stream client owns reconnection, so by the time the sender drops
    /// its retry budget is spent.
    pub async fn run(&self, mut inbound: mpsc::Receiver<String>) {
        info!(topic = %self.topic, "Ingestor started");

        while let Some(raw) = inbound.recv().await {
            match (self.normalize)(&raw) {
                Ok(payloads) => {
                    for payload in payloads {
                        self.bus.publish(self.topic, payload);
                    }
                }
                Err(e) => {
                    warn!(topic = %self.topic, error = %e, "Dropping malformed event");
                }
            }
        }

        info!(topic = %self.topic, "Inbound stream closed, ingestor exiting");
    }
}
