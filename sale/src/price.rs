// Copyright (c) 2024 Botho Foundation

//! Exact rational unit prices.
//!
//! Sale prices such as "one payment unit buys 18182 tokens" have no exact
//! fixed-point representation, so a price is kept as the ratio
//! `payment / quantity` and every conversion rounds explicitly:
//!
//! ```text
//! affordable(p) = floor(p × quantity / payment)   (buyer never overdraws)
//! cost(q)       = ceil(q × payment / quantity)    (seller never undercharged)
//! ```
//!
//! Because `affordable` floors, `cost(affordable(p)) <= p` always holds.

use std::{cmp::Ordering, fmt};

use tlc_token::{
    math::{cmp_ratio, mul_div_ceil, mul_div_floor, mul_div_floor_capped},
    Amount, UNIT,
};

use crate::error::SaleError;

/// `payment` payment-asset units buy `quantity` inventory units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitPrice {
    pub payment: Amount,
    pub quantity: Amount,
}

impl UnitPrice {
    /// Create a price, rejecting zero components.
    pub fn new(payment: Amount, quantity: Amount) -> Result<Self, SaleError> {
        if payment == 0 || quantity == 0 {
            return Err(SaleError::InvalidPrice { payment, quantity });
        }
        Ok(Self { payment, quantity })
    }

    /// Price of one whole token, in payment base units (e.g. `0.001 × 10^18`).
    pub fn per_token(payment_units: Amount) -> Result<Self, SaleError> {
        Self::new(payment_units, UNIT)
    }

    /// Whole-token rate: `token_units` base units per one whole payment unit.
    pub fn tokens_per_payment(token_units: Amount) -> Result<Self, SaleError> {
        Self::new(UNIT, token_units)
    }

    /// Inventory units `payment` can buy, at most `cap`.
    pub fn affordable(&self, payment: Amount, cap: Amount) -> Amount {
        mul_div_floor_capped(payment, self.quantity, self.payment, cap)
    }

    /// Inventory units `payment` can buy, uncapped.
    pub fn quantity_for(&self, payment: Amount) -> Result<Amount, SaleError> {
        Ok(mul_div_floor(payment, self.quantity, self.payment)?)
    }

    /// Payment needed for `quantity` units, rounded up.
    pub fn cost(&self, quantity: Amount) -> Result<Amount, SaleError> {
        Ok(mul_div_ceil(quantity, self.payment, self.quantity)?)
    }

    /// Smallest payment that buys one unit.
    pub fn minimum_payment(&self) -> Result<Amount, SaleError> {
        self.cost(1)
    }

    /// Compare by payment per unit; a greater price is more expensive.
    pub fn cmp_cost(&self, other: &Self) -> Ordering {
        cmp_ratio(self.payment, self.quantity, other.payment, other.quantity)
    }
}

impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.payment, self.quantity)
    }
}
