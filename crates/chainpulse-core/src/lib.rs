//! Core domain types for the chainpulse feed pipeline.
//!
//! This crate provides the fundamental types shared by every pipeline:
//! - `Topic`: compile-time set of bus channel identifiers
//! - `Message`: the canonical envelope published on the bus
//! - `Payload`: one variant per feed schema
//! - Unit conversions between wei, Gwei and ETH

pub mod error;
pub mod message;
pub mod topic;
pub mod types;
pub mod units;

pub use error::{CoreError, Result};
pub use message::Message;
pub use topic::Topic;
pub use types::{BlockHeader, EthPrice, GasPrice, GasTick, GlobalMetrics, MarkPrice, MinerReward, Payload};
