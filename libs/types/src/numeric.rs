//! Amount helpers
//!
//! All amounts are `Decimal` values in micro-NAMO, the chain's smallest unit.
//! One rupee-equivalent is `MICRO_PER_RUPEE` units.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::InputError;

/// Micro-units per rupee-equivalent
pub const MICRO_PER_RUPEE: i64 = 1_000_000;

/// Rupees in one crore
pub const RUPEES_PER_CRORE: i64 = 10_000_000;

/// Rupees in one lakh
pub const RUPEES_PER_LAKH: i64 = 100_000;

/// Convert a whole rupee figure into micro-units
pub fn rupees(amount: i64) -> Decimal {
    Decimal::from(amount) * Decimal::from(MICRO_PER_RUPEE)
}

/// Convert a lakh figure into micro-units
pub fn lakhs(amount: i64) -> Decimal {
    rupees(amount * RUPEES_PER_LAKH)
}

/// Convert a crore figure into micro-units
pub fn crores(amount: i64) -> Decimal {
    rupees(amount * RUPEES_PER_CRORE)
}

/// Whole rupees in a micro-unit amount, truncated toward zero
pub fn to_whole_rupees(amount: Decimal) -> Decimal {
    (amount / Decimal::from(MICRO_PER_RUPEE)).trunc()
}

/// Parse a required decimal string field
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal, InputError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(InputError::MissingField(field));
    }
    Decimal::from_str(raw).map_err(|_| InputError::InvalidDecimal {
        field,
        value: raw.to_string(),
    })
}

/// Parse a required non-negative amount
pub fn parse_amount(field: &'static str, raw: &str) -> Result<Decimal, InputError> {
    let value = parse_decimal(field, raw)?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(InputError::NegativeAmount {
            field,
            value: raw.trim().to_string(),
        });
    }
    Ok(value)
}

/// Parse a required strictly positive amount
pub fn parse_positive_amount(field: &'static str, raw: &str) -> Result<Decimal, InputError> {
    let value = parse_amount(field, raw)?;
    if value.is_zero() {
        return Err(InputError::NonPositive {
            field,
            value: raw.trim().to_string(),
        });
    }
    Ok(value)
}

/// Parse an optional amount: empty input yields `None`
pub fn parse_optional_amount(
    field: &'static str,
    raw: &str,
) -> Result<Option<Decimal>, InputError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_amount(field, raw).map(Some)
}
