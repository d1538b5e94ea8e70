//! chainpulse - Entry Point
//!
//! One subcommand per pipeline; each process runs one pipeline and is
//! restarted by the supervisor on exit.

use anyhow::Result;
use chainpulse_app::{AppConfig, Application, Pipeline};
use clap::{Parser, Subcommand};
use tracing::info;

/// Real-time market/chain feed pipeline
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via CHAINPULSE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Crawl Ethereum block headers
    BlockHeader,
    /// Crawl the ETH/USD mark price
    EthPrice,
    /// Crawl gas-price ticks and derive USD transfer costs
    GasPrice,
    /// Fan out per-currency mark prices from the exchange stream
    MarkPrice,
    /// Poll aggregate market metrics
    GlobalMetrics,
    /// Derive per-block miner revenue in USD
    MinerRevenue,
    /// Run every pipeline in one process
    All,
}

impl From<Command> for Pipeline {
    fn from(command: Command) -> Self {
        match command {
            Command::BlockHeader => Pipeline::BlockHeader,
            Command::EthPrice => Pipeline::EthPrice,
            Command::GasPrice => Pipeline::GasPrice,
            Command::MarkPrice => Pipeline::MarkPrice,
            Command::GlobalMetrics => Pipeline::GlobalMetrics,
            Command::MinerRevenue => Pipeline::MinerRevenue,
            Command::All => Pipeline::All,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any WS connections)
    chainpulse_ws::init_crypto();

    let args = Args::parse();

    chainpulse_telemetry::init_logging()?;

    info!("Starting chainpulse v{}", env!("CARGO_PKG_VERSION"));

    // Determine config path: CLI arg > CHAINPULSE_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("CHAINPULSE_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = AppConfig::load(&config_path)?;

    let app = Application::new(config);
    app.run(args.command.into()).await?;

    Ok(())
}
