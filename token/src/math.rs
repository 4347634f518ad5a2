// Copyright (c) 2024 Botho Foundation

//! Overflow-checked fixed-point helpers.
//!
//! Products of two `u128` amounts are formed in 256 bits and narrowed back
//! with a checked conversion, so `a * b / d` never wraps and only fails when
//! the final quotient itself does not fit.

use primitive_types::U256;

use crate::{error::TokenError, ledger::Amount};

/// `floor(a * b / d)`.
pub fn mul_div_floor(a: Amount, b: Amount, d: Amount) -> Result<Amount, TokenError> {
    if d == 0 {
        return Err(TokenError::ArithmeticOverflow);
    }
    narrow(U256::from(a) * U256::from(b) / U256::from(d))
}

/// `ceil(a * b / d)`.
pub fn mul_div_ceil(a: Amount, b: Amount, d: Amount) -> Result<Amount, TokenError> {
    if d == 0 {
        return Err(TokenError::ArithmeticOverflow);
    }
    let product = U256::from(a) * U256::from(b);
    let divisor = U256::from(d);
    let quotient = product / divisor;
    if (product % divisor).is_zero() {
        narrow(quotient)
    } else {
        narrow(quotient + U256::one())
    }
}

/// `min(floor(a * b / d), cap)`.
///
/// Never fails on a large quotient since the result is bounded by `cap`.
pub fn mul_div_floor_capped(a: Amount, b: Amount, d: Amount, cap: Amount) -> Amount {
    if d == 0 {
        return 0;
    }
    let quotient = U256::from(a) * U256::from(b) / U256::from(d);
    let cap_wide = U256::from(cap);
    if quotient >= cap_wide {
        cap
    } else {
        quotient.low_u128()
    }
}

/// Compare `a_num / a_den` against `b_num / b_den` by cross-multiplication.
pub fn cmp_ratio(
    a_num: Amount,
    a_den: Amount,
    b_num: Amount,
    b_den: Amount,
) -> core::cmp::Ordering {
    (U256::from(a_num) * U256::from(b_den)).cmp(&(U256::from(b_num) * U256::from(a_den)))
}

fn narrow(value: U256) -> Result<Amount, TokenError> {
    if value.bits() > 128 {
        Err(TokenError::ArithmeticOverflow)
    } else {
        Ok(value.low_u128())
    }
}
