//! Ethereum unit conversions.
//!
//! All monetary arithmetic in the pipeline is IEEE f64.

/// Wei per ETH.
pub const WEI_PER_ETH: f64 = 1e18;

/// Wei per Gwei.
pub const WEI_PER_GWEI: f64 = 1e9;

/// Gas consumed by a plain ETH transfer.
pub const TRANSFER_GAS_LIMIT: f64 = 21_000.0;

/// Convert a wei amount to ETH.
pub fn wei_to_eth(wei: u64) -> f64 {
    wei as f64 / WEI_PER_ETH
}

/// Convert a wei amount to Gwei.
pub fn wei_to_gwei(wei: u64) -> f64 {
    wei as f64 / WEI_PER_GWEI
}

/// Convert a Gwei amount to ETH.
pub fn gwei_to_eth(gwei: f64) -> f64 {
    gwei * WEI_PER_GWEI / WEI_PER_ETH
}

/// USD cost of a plain transfer at the given per-gas price and ETH price.
pub fn transfer_cost_usd(gas_price_gwei: f64, eth_price: f64) -> f64 {
    gwei_to_eth(gas_price_gwei) * TRANSFER_GAS_LIMIT * eth_price
}

/// Decode a 0x-prefixed hex quantity, as used by Ethereum JSON-RPC.
pub fn parse_hex_quantity(value: &str) -> crate::Result<u64> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| crate::CoreError::InvalidQuantity(value.to_string()))?;
    u64::from_str_radix(digits, 16)
        .map_err(|_| crate::CoreError::InvalidQuantity(value.to_string()))
}
