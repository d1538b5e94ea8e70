//! Topic-addressed publish/subscribe and latest-value state.
//!
//! Two primitives, both keyed by [`Topic`](chainpulse_core::Topic):
//! - [`Bus`]: best-effort fan-out of messages to current subscribers
//! - [`LatestValueCache`]: a single overwritten slot per topic, with a
//!   presence signal that joiners block on during warm-up

pub mod bus;
pub mod cache;

pub use bus::Bus;
pub use cache::LatestValueCache;
