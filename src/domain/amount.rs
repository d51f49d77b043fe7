//! Exact decimal <-> base-unit conversion for reward amounts.
//!
//! Report amounts are human-readable decimal strings ("1.5"). On-chain balances
//! are integers scaled by the token's decimals. Conversions go through alloy's
//! unit helpers so nothing ever passes through floating point.

use alloy::primitives::utils::{format_units, parse_units, ParseUnits};
use alloy::primitives::U256;

use crate::error::{ClaimError, Result};

/// Largest decimals value representable by a 256-bit integer scale factor
pub const MAX_DECIMALS: u8 = 77;

/// Scale a decimal string into base units (`amount * 10^decimals`).
pub fn scale_amount(amount: &str, decimals: u8) -> Result<U256> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(ClaimError::InvalidAmount("empty amount".to_string()));
    }
    if decimals > MAX_DECIMALS {
        return Err(ClaimError::InvalidAmount(format!(
            "decimals {decimals} exceeds {MAX_DECIMALS}"
        )));
    }

    // parse_units would silently drop precision here; a claim must match the
    // report exactly or not at all.
    if let Some((_, fraction)) = trimmed.split_once('.') {
        let significant = fraction.trim_end_matches('0');
        if significant.len() > decimals as usize {
            return Err(ClaimError::InvalidAmount(format!(
                "{trimmed} has more than {decimals} fractional digits"
            )));
        }
    }

    match parse_units(trimmed, decimals) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(ClaimError::InvalidAmount(format!(
            "{trimmed} is negative"
        ))),
        Err(e) => Err(ClaimError::InvalidAmount(format!("{trimmed}: {e}"))),
    }
}

/// Render base units as a decimal string without trailing zeros ("1.5", "3").
pub fn format_amount(value: U256, decimals: u8) -> Result<String> {
    let rendered = format_units(value, decimals)
        .map_err(|e| ClaimError::InvalidAmount(format!("{value}: {e}")))?;

    if !rendered.contains('.') {
        return Ok(rendered);
    }
    Ok(rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string())
}

/// Serde adapter writing `U256` as a base-10 integer string.
pub mod u256_decimal {
    use alloy::primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_str_radix(raw.trim(), 10).map_err(D::Error::custom)
    }
}
