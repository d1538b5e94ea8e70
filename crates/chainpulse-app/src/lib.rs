//! chainpulse application: configuration and pipeline wiring.

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, Pipeline};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
