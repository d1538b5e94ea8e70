//! Per-feed normalizers.
//!
//! Each normalizer turns one raw inbound event into zero or more
//! canonical payloads. They are pure: the same raw event always yields
//! identical payloads, and nothing here touches the network or clock.
//!
//! A normalizer returns a vector because one event may carry no message
//! (a subscription ack), one message (a price tick), or many (the
//! multi-symbol mark-price array).

use crate::error::{FeedError, FeedResult};
use chainpulse_core::types::{
    BlockHeader, EthPrice, GasTick, GlobalMetrics, MarkPrice, Payload,
};
use chainpulse_core::units::{parse_hex_quantity, WEI_PER_GWEI};
use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

// ---------------------------------------------------------------------------
// Block headers (full-node JSON-RPC subscription)
// ---------------------------------------------------------------------------

/// JSON-RPC envelope: either a subscription ack (`id` + `result`) or an
/// `eth_subscription` notification carrying a header.
#[derive(Debug, Deserialize)]
struct RawRpcEnvelope {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<RawSubscriptionParams>,
}

#[derive(Debug, Deserialize)]
struct RawSubscriptionParams {
    result: RawHeader,
}

/// Header notification payload. Quantities are 0x-prefixed hex.
#[derive(Debug, Deserialize)]
struct RawHeader {
    number: String,
    hash: String,
    timestamp: String,
    miner: String,
    #[serde(rename = "gasUsed")]
    gas_used: String,
    #[serde(rename = "gasLimit")]
    gas_limit: String,
}

/// Normalize one full-node subscription event.
///
/// Subscription acks normalize to no messages.
pub fn parse_block_header_event(raw: &str) -> FeedResult<Vec<Payload>> {
    let envelope: RawRpcEnvelope = serde_json::from_str(raw)?;

    if envelope.method.as_deref() == Some("eth_subscription") {
        let header = envelope
            .params
            .ok_or_else(|| FeedError::ParseError("eth_subscription without params".to_string()))?
            .result;

        let hex = |field: &str, value: &str| {
            parse_hex_quantity(value)
                .map_err(|_| FeedError::InvalidData(format!("Bad {field}: {value}")))
        };

        return Ok(vec![Payload::BlockHeader(BlockHeader {
            number: hex("number", &header.number)?,
            hash: header.hash,
            timestamp: hex("timestamp", &header.timestamp)?,
            miner: header.miner,
            gas_used: hex("gasUsed", &header.gas_used)?,
            gas_limit: hex("gasLimit", &header.gas_limit)?,
        })]);
    }

    if envelope.id.is_some() {
        debug!("Subscription ack received");
        return Ok(Vec::new());
    }

    Err(FeedError::ParseError("Unrecognized RPC event".to_string()))
}

// ---------------------------------------------------------------------------
// ETH price (exchange mark-price stream, single symbol)
// ---------------------------------------------------------------------------

/// Exchange mark-price tick. The price arrives as a string decimal.
#[derive(Debug, Deserialize)]
struct RawPriceTick {
    #[serde(rename = "p")]
    price: String,
}

/// Normalize one ETH/USD mark-price tick to a single float.
pub fn parse_eth_price_tick(raw: &str) -> FeedResult<Vec<Payload>> {
    let tick: RawPriceTick = serde_json::from_str(raw)?;
    let price = parse_price(&tick.price)?;
    Ok(vec![Payload::EthPrice(EthPrice { price })])
}

// ---------------------------------------------------------------------------
// Gas price ticks
// ---------------------------------------------------------------------------

/// Gas stream event: four tiers in wei plus a millisecond timestamp.
#[derive(Debug, Deserialize)]
struct RawGasEvent {
    data: RawGasData,
}

#[derive(Debug, Deserialize)]
struct RawGasData {
    #[serde(rename = "gasPrices")]
    gas_prices: RawGasTiers,
    timestamp: u64,
}

#[derive(Debug, Deserialize)]
struct RawGasTiers {
    rapid: u64,
    fast: u64,
    standard: u64,
    slow: u64,
}

/// Normalize one gas-price event into four independently-denominated
/// Gwei tiers plus the tick timestamp.
pub fn parse_gas_tick(raw: &str) -> FeedResult<Vec<Payload>> {
    let event: RawGasEvent = serde_json::from_str(raw)?;
    let tiers = event.data.gas_prices;

    let to_gwei = |wei: u64| wei as f64 / WEI_PER_GWEI;

    Ok(vec![Payload::GasTick(GasTick {
        rapid: to_gwei(tiers.rapid),
        fast: to_gwei(tiers.fast),
        standard: to_gwei(tiers.standard),
        slow: to_gwei(tiers.slow),
        timestamp: event.data.timestamp,
    })])
}

// ---------------------------------------------------------------------------
// Mark prices (exchange stream, all symbols)
// ---------------------------------------------------------------------------

/// One entry of the all-symbols mark-price array.
#[derive(Debug, Deserialize)]
struct RawMarkPrice {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p")]
    price: String,
}

/// Normalize an all-symbols mark-price event: one message per symbol
/// with a recognized quote suffix; other symbols are skipped.
pub fn parse_mark_price_events(raw: &str) -> FeedResult<Vec<Payload>> {
    let entries: Vec<RawMarkPrice> = serde_json::from_str(raw)?;

    let mut payloads = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(currency) = base_currency(&entry.symbol) else {
            continue;
        };
        let price = parse_price(&entry.price)?;
        payloads.push(Payload::MarkPrice(MarkPrice {
            currency: currency.to_string(),
            price,
        }));
    }
    Ok(payloads)
}

/// Strip a recognized quote suffix from an exchange symbol.
fn base_currency(symbol: &str) -> Option<&str> {
    symbol
        .strip_suffix("USD_PERP")
        .or_else(|| symbol.strip_suffix("USDT"))
        .or_else(|| symbol.strip_suffix("BUSD"))
}

fn parse_price(value: &str) -> FeedResult<f64> {
    value
        .parse::<f64>()
        .map_err(|_| FeedError::InvalidData(format!("Bad price: {value}")))
}

// ---------------------------------------------------------------------------
// Global market metrics (REST body)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawMetricsEnvelope {
    data: RawMetricsData,
}

#[derive(Debug, Deserialize)]
struct RawMetricsData {
    active_cryptocurrencies: u64,
    active_exchanges: u64,
    btc_dominance: f64,
    eth_dominance: f64,
    last_updated: String,
    quote: RawMetricsQuote,
}

#[derive(Debug, Deserialize)]
struct RawMetricsQuote {
    #[serde(rename = "USD")]
    usd: RawUsdQuote,
}

#[derive(Debug, Deserialize)]
struct RawUsdQuote {
    total_market_cap: f64,
    total_volume_24h: f64,
    altcoin_market_cap: f64,
    altcoin_volume_24h: f64,
    defi_market_cap: f64,
    defi_volume_24h: f64,
    stablecoin_market_cap: f64,
    stablecoin_volume_24h: f64,
    derivatives_volume_24h: f64,
}

/// Normalize a metrics response body: the USD quote sub-object is
/// flattened into the top-level record and `last_updated` becomes a
/// millisecond timestamp.
pub fn parse_global_metrics(body: &str) -> FeedResult<Vec<Payload>> {
    let envelope: RawMetricsEnvelope = serde_json::from_str(body)?;
    let data = envelope.data;
    let usd = data.quote.usd;

    let timestamp = DateTime::parse_from_rfc3339(&data.last_updated)
        .map_err(|_| FeedError::InvalidData(format!("Bad last_updated: {}", data.last_updated)))?
        .timestamp_millis() as u64;

    Ok(vec![Payload::GlobalMetrics(GlobalMetrics {
        active_cryptocurrencies: data.active_cryptocurrencies,
        active_exchanges: data.active_exchanges,
        btc_dominance: data.btc_dominance,
        eth_dominance: data.eth_dominance,
        total_market_cap: usd.total_market_cap,
        total_volume_24h: usd.total_volume_24h,
        altcoin_market_cap: usd.altcoin_market_cap,
        altcoin_volume_24h: usd.altcoin_volume_24h,
        defi_market_cap: usd.defi_market_cap,
        defi_volume_24h: usd.defi_volume_24h,
        stablecoin_market_cap: usd.stablecoin_market_cap,
        stablecoin_volume_24h: usd.stablecoin_volume_24h,
        derivatives_volume_24h: usd.derivatives_volume_24h,
        timestamp,
    })])
}
