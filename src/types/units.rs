//! Token unit conversion.
//!
//! ## Overview
//!
//! Fungible tokens count in integer base units. A token with `decimals = 18`
//! represents `1.0` as `10^18` base units. The book itself only ever sees
//! base units; these helpers convert human-readable decimal strings at the
//! edges (configuration, tests, the demo binary).
//!
//! Conversion goes through `rust_decimal` so no floating point is involved.
//!
//! ## Examples
//!
//! ```
//! use step_book::types::units::{parse_amount, format_amount};
//!
//! let raw = parse_amount("1000", 18).unwrap();
//! assert_eq!(raw, 1_000_000_000_000_000_000_000);
//!
//! assert_eq!(format_amount(raw, 18).unwrap(), "1000");
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Largest `decimals` value accepted by the conversions.
///
/// `10^19` is the first power of ten that no longer fits a `u64` multiplier.
pub const MAX_DECIMALS: u32 = 18;

/// Base units per whole token for a token with `decimals` places
pub fn unit(decimals: u32) -> Option<u128> {
    if decimals > MAX_DECIMALS {
        return None;
    }
    10u128.checked_pow(decimals)
}

/// Convert a decimal string to base units
///
/// # Returns
///
/// * `Some(u128)` - The base-unit amount
/// * `None` - If parsing fails, the value is negative, carries more
///   precision than `decimals`, or does not fit
///
/// # Example
///
/// ```
/// use step_book::types::units::parse_amount;
///
/// assert_eq!(parse_amount("1.5", 6), Some(1_500_000));
/// assert_eq!(parse_amount("0.0000001", 6), None);
/// assert_eq!(parse_amount("-1", 6), None);
/// ```
pub fn parse_amount(s: &str, decimals: u32) -> Option<u128> {
    let decimal = Decimal::from_str(s.trim()).ok()?;
    decimal_to_units(decimal, decimals)
}

/// Convert a `Decimal` to base units
pub fn decimal_to_units(d: Decimal, decimals: u32) -> Option<u128> {
    if d.is_sign_negative() && !d.is_zero() {
        return None;
    }
    if decimals > MAX_DECIMALS {
        return None;
    }

    let multiplier = Decimal::from(10u64.checked_pow(decimals)?);
    let scaled = d.checked_mul(multiplier)?;
    if !scaled.fract().is_zero() {
        return None;
    }
    scaled.to_u128()
}

/// Convert base units to a trimmed decimal string
///
/// Returns `None` when `value` exceeds the 96-bit mantissa `Decimal` can hold.
///
/// # Example
///
/// ```
/// use step_book::types::units::format_amount;
///
/// assert_eq!(format_amount(1_500_000, 6).as_deref(), Some("1.5"));
/// assert_eq!(format_amount(0, 6).as_deref(), Some("0"));
/// ```
pub fn format_amount(value: u128, decimals: u32) -> Option<String> {
    if decimals > MAX_DECIMALS {
        return None;
    }
    let signed = i128::try_from(value).ok()?;
    let decimal = Decimal::try_from_i128_with_scale(signed, decimals).ok()?;
    Some(decimal.normalize().to_string())
}

// ============================================================================
// Unit Tests
// ============================================================================
