//! Constants and precision values for the USDC panel

use alloy::primitives::utils::parse_units;
use alloy::primitives::{address, Address, U256};
use eyre::{Context, Result};

/// USDC has 6 decimals
pub const USDC_DECIMALS: u8 = 6;

/// USDC token contract on Sepolia
pub const SEPOLIA_USDC: Address = address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238");

/// Sepolia chain ID
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

/// Amount approved by the "Approve Transfer" action, in whole tokens
pub const DEFAULT_APPROVAL_AMOUNT: &str = "10.0";

/// Amount moved by each relay transfer, in base units (0.01 USDC)
pub const DEFAULT_RELAY_VALUE: u64 = 10_000;

/// Account the relay pulls funds from
pub const DEFAULT_RELAY_FROM: Address = address!("E0B2A968Fc566bce543E9da6D3893FfE1170B833");

/// Account the relay pays out to
pub const DEFAULT_RELAY_TO: Address = address!("55Eca4d519Ca2BdC60C8f886aB00B5281772E517");

/// Seconds between relay transfers when run periodically
pub const DEFAULT_RELAY_INTERVAL_SECS: u64 = 10;

/// Scale a decimal literal (e.g. "10.0") to base units with specified decimals
///
/// Parsing is exact; literals with more fractional digits than `decimals`
/// are rejected rather than rounded.
pub fn scale_to_decimals(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    eyre::ensure!(
        !amount.starts_with('-'),
        "Token amount must not be negative: {}",
        amount
    );
    if let Some((_, fraction)) = amount.split_once('.') {
        eyre::ensure!(
            fraction.len() <= decimals as usize,
            "Token amount {} has more than {} decimal places",
            amount,
            decimals
        );
    }
    let parsed = parse_units(amount, decimals)
        .with_context(|| format!("Invalid token amount {:?}", amount))?;
    Ok(parsed.get_absolute())
}
