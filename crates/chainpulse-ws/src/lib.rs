//! WebSocket client for chainpulse feed connections.
//!
//! Provides one primitive: a long-lived streaming connection that forwards
//! every inbound text frame to a channel, with:
//! - optional initial requests sent after connect (e.g. an `eth_subscribe`
//!   JSON-RPC call)
//! - automatic reconnection with exponential backoff
//! - cancellation-aware shutdown

pub mod connection;
pub mod error;

pub use connection::{StreamClient, StreamConfig};
pub use error::{WsError, WsResult};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
