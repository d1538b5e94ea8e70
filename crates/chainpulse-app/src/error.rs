//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] chainpulse_ws::WsError),

    #[error("Feed error: {0}")]
    Feed(#[from] chainpulse_feed::FeedError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] chainpulse_lookup::LookupError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] chainpulse_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
