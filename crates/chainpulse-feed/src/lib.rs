//! Feed ingestion for chainpulse.
//!
//! One ingestor per external feed: inbound events are normalized by a
//! pure, feed-specific function into canonical payloads and published to
//! a fixed topic. Malformed events are dropped with a report; ingestion
//! continues.

pub mod error;
pub mod ingestor;
pub mod metrics;
pub mod normalize;

pub use error::{FeedError, FeedResult};
pub use ingestor::FeedIngestor;
pub use metrics::{GlobalMetricsPoller, MetricsConfig};
pub use normalize::{
    parse_block_header_event, parse_eth_price_tick, parse_gas_tick, parse_mark_price_events,
    parse_global_metrics,
};
