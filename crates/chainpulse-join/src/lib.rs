//! Latest-value stream joins.
//!
//! A joiner subscribes to one primary topic, warms up until every
//! auxiliary topic has a cached value, then derives one result message
//! per primary message using the *latest* auxiliary values at the moment
//! of processing. Staleness-tolerant by design: joins never pin an
//! auxiliary value to the primary message's own timestamp.

pub mod error;
pub mod gas_usd;
pub mod joiner;
pub mod miner_revenue;
pub mod tracker;

pub use error::{JoinError, JoinResult};
pub use gas_usd::GasUsdJoin;
pub use joiner::{AuxValues, Join, JoinContext, StreamJoiner};
pub use miner_revenue::MinerRevenueJoin;
pub use tracker::track_latest;
