//! WebSocket stream client.
//!
//! Handles connection lifecycle and reconnection with exponential backoff,
//! and forwards inbound text frames to the ingestor channel. Parsing is
//! the ingestor's job; this layer only moves frames.

use crate::error::{WsError, WsResult};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Stream connection configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket URL.
    pub url: String,
    /// Requests sent once after every (re)connect, in order.
    /// Empty for URL-addressed streams.
    pub init_requests: Vec<String>,
    /// Maximum reconnection attempts (0 = infinite).
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    pub reconnect_max_delay_ms: u64,
}

impl StreamConfig {
    /// Config for a URL-addressed stream with default backoff.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            init_requests: Vec::new(),
            max_reconnect_attempts: 0,
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 60000,
        }
    }

    /// Add a request to send after every (re)connect.
    pub fn with_init_request(mut self, request: impl Into<String>) -> Self {
        self.init_requests.push(request.into());
        self
    }
}

/// Long-lived streaming connection.
///
/// `run()` does not return under normal operation: it keeps the
/// connection alive, reconnecting with backoff, until the attempt budget
/// is exhausted, the inbound receiver is dropped, or shutdown is
/// requested.
pub struct StreamClient {
    config: StreamConfig,
    inbound_tx: mpsc::Sender<String>,
    shutdown: CancellationToken,
}

impl StreamClient {
    pub fn new(config: StreamConfig, inbound_tx: mpsc::Sender<String>) -> Self {
        Self {
            config,
            inbound_tx,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token to cancel the connect loop from another task.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Connect and forward frames, reconnecting on failure.
    pub async fn run(&self) -> WsResult<()> {
        let mut attempt = 0u32;

        loop {
            if self.shutdown.is_cancelled() {
                info!("Shutdown requested, exiting connect loop");
                return Ok(());
            }

            match self.try_connect().await {
                Ok(()) => {
                    // Receiver dropped or shutdown; nothing left to feed.
                    return Ok(());
                }
                Err(e) => {
                    error!(url = %self.config.url, ?e, "Stream connection error");
                }
            }

            attempt += 1;
            if self.config.max_reconnect_attempts > 0
                && attempt >= self.config.max_reconnect_attempts
            {
                error!(attempt, "Max reconnection attempts reached");
                return Err(WsError::ConnectionFailed(
                    "Max reconnection attempts reached".to_string(),
                ));
            }

            let delay = self.backoff_delay(attempt);
            warn!(attempt, delay_ms = delay.as_millis(), "Reconnecting");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown.cancelled() => {
                    info!("Shutdown requested during backoff, exiting");
                    return Ok(());
                }
            }
        }
    }

    /// One connection attempt: connect, send init requests, pump frames.
    ///
    /// Returns `Ok(())` only when there is nothing left to do (receiver
    /// dropped or shutdown); connection-level failures return `Err` so
    /// the caller can back off and retry.
    async fn try_connect(&self) -> WsResult<()> {
        info!(url = %self.config.url, "Connecting to stream");

        let (ws_stream, _response) = connect_async(&self.config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        info!(url = %self.config.url, "Stream connected");

        for request in &self.config.init_requests {
            debug!(%request, "Sending init request");
            write.send(Message::Text(request.clone())).await?;
        }

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    info!("Shutdown signal received in stream loop");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        warn!(?e, "Failed to send Close frame during shutdown");
                    }
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if self.inbound_tx.send(text).await.is_err() {
                                warn!("Inbound receiver dropped, closing stream");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            warn!(code, %reason, "Stream closed by server");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => {
                            error!(?e, "Stream read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("Stream ended");
                            return Err(WsError::ConnectionClosed {
                                code: 1006,
                                reason: "Stream ended".to_string(),
                            });
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.reconnect_base_delay_ms;
        let max = self.config.reconnect_max_delay_ms;

        // base * 2^(attempt-1), capped
        let exponent = attempt.saturating_sub(1).min(10);
        let delay = base.saturating_mul(1u64 << exponent).min(max);

        Duration::from_millis(delay + rand_jitter())
    }
}

/// Generate random jitter (0-1000ms).
fn rand_jitter() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_url_defaults() {
        let config = StreamConfig::for_url("wss://example.org/ws");
        assert_eq!(config.max_reconnect_attempts, 0); // Infinite
        assert!(config.init_requests.is_empty());
    }

    #[test]
    fn test_with_init_request() {
        let config = StreamConfig::for_url("wss://example.org/ws")
            .with_init_request(r#"{"id":1,"method":"eth_subscribe"}"#);
        assert_eq!(config.init_requests.len(), 1);
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let config = StreamConfig {
            url: String::new(),
            init_requests: Vec::new(),
            max_reconnect_attempts: 0,
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 8000,
        };
        let (tx, _rx) = mpsc::channel(1);
        let client = StreamClient::new(config, tx);

        let d1 = client.backoff_delay(1).as_millis() as u64;
        let d2 = client.backoff_delay(2).as_millis() as u64;
        let d4 = client.backoff_delay(4).as_millis() as u64;
        let d10 = client.backoff_delay(10).as_millis() as u64;

        // Jitter adds at most one second on top of the deterministic part.
        assert!((1000..2000).contains(&d1));
        assert!((2000..3000).contains(&d2));
        assert!((8000..9000).contains(&d4));
        assert!((8000..9000).contains(&d10));
    }
}
