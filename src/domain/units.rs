//! Fixed-point conversion between raw token integers and decimal USD values.

use crate::domain::Decimal;
use alloy_primitives::U256;
use rust_decimal::Decimal as RustDecimal;
use thiserror::Error;

/// Largest scale a `rust_decimal` value can carry.
const MAX_DECIMAL_SCALE: u8 = 28;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("amount {0} does not fit in a decimal")]
    Overflow(U256),
    #[error("unsupported token decimals: {0}")]
    Decimals(u8),
}

/// Divide a raw integer amount by `10^decimals`.
///
/// The integer side is computed in 256-bit arithmetic. Fractional digits beyond
/// 28 places are truncated; an integer part larger than the decimal range is an
/// error rather than a wrapped value.
pub fn scale_down(raw: U256, decimals: u8) -> Result<Decimal, UnitsError> {
    let ten = U256::from(10u8);
    let divisor = ten
        .checked_pow(U256::from(decimals))
        .ok_or(UnitsError::Decimals(decimals))?;

    let whole = to_decimal(raw / divisor, 0).ok_or(UnitsError::Overflow(raw))?;

    let scale = decimals.min(MAX_DECIMAL_SCALE);
    let frac = (raw % divisor) / ten.pow(U256::from(decimals - scale));
    let frac = to_decimal(frac, scale as u32).ok_or(UnitsError::Overflow(raw))?;

    whole
        .checked_add(frac)
        .map(Decimal::new)
        .ok_or(UnitsError::Overflow(raw))
}

/// USD value of `raw` token units at `unit_price_usd`.
///
/// A zero price always yields zero, whatever the amount.
pub fn value_usd(raw: U256, decimals: u8, unit_price_usd: Decimal) -> Result<Decimal, UnitsError> {
    if unit_price_usd.is_zero() {
        return Ok(Decimal::zero());
    }
    scale_down(raw, decimals)?
        .checked_mul(unit_price_usd)
        .ok_or(UnitsError::Overflow(raw))
}

fn to_decimal(value: U256, scale: u32) -> Option<RustDecimal> {
    let value = u128::try_from(value).ok()?;
    let value = i128::try_from(value).ok()?;
    RustDecimal::try_from_i128_with_scale(value, scale).ok()
}
