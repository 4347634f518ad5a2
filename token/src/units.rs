// Copyright (c) 2024 Botho Foundation

//! Decimal display and parsing of base-unit amounts.
//!
//! Both the token and the payment asset use 18 decimals: `1.5` is
//! `1_500_000_000_000_000_000` base units.

use thiserror::Error;

use crate::ledger::Amount;

/// Decimal places of the token and of the payment asset.
pub const TOKEN_DECIMALS: u32 = 18;

/// Base units in one whole token.
pub const UNIT: Amount = 10u128.pow(TOKEN_DECIMALS);

/// Errors from [`parse_units`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("empty amount")]
    Empty,

    #[error("invalid character {0:?} in amount")]
    InvalidDigit(char),

    #[error("amount has more than {max} decimal places")]
    TooManyDecimals { max: u32 },

    #[error("amount does not fit in 128 bits")]
    Overflow,
}

/// Parse a decimal string such as `"10_000"` or `"0.001"` into base units.
pub fn parse_units(input: &str, decimals: u32) -> Result<Amount, UnitsError> {
    let cleaned: String = input.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, fraction) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitsError::Empty);
    }
    if fraction.len() > decimals as usize {
        return Err(UnitsError::TooManyDecimals { max: decimals });
    }

    let scale = 10u128.checked_pow(decimals).ok_or(UnitsError::Overflow)?;
    let whole_units = parse_digits(whole)?
        .checked_mul(scale)
        .ok_or(UnitsError::Overflow)?;

    let padding = 10u128
        .checked_pow(decimals - fraction.len() as u32)
        .ok_or(UnitsError::Overflow)?;
    let fraction_units = parse_digits(fraction)?
        .checked_mul(padding)
        .ok_or(UnitsError::Overflow)?;

    whole_units
        .checked_add(fraction_units)
        .ok_or(UnitsError::Overflow)
}

/// Render base units as a decimal string, trimming trailing zeros.
pub fn format_units(amount: Amount, decimals: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = amount / scale;
    let fraction = amount % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{fraction:0width$}", width = decimals as usize);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

fn parse_digits(digits: &str) -> Result<Amount, UnitsError> {
    let mut value: Amount = 0;
    for c in digits.chars() {
        let digit = c.to_digit(10).ok_or(UnitsError::InvalidDigit(c))?;
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit as Amount))
            .ok_or(UnitsError::Overflow)?;
    }
    Ok(value)
}
