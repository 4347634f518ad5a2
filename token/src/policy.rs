// Copyright (c) 2024 Botho Foundation

//! Sell-fee policy.
//!
//! ## Fee Formula
//!
//! ```text
//! fee       = floor(amount × fee_rate_bps / 10000)
//! delivered = amount − fee
//! ```
//!
//! Only transfers whose recipient is the fee trigger (the liquidity pool, so
//! effectively sells) are taxed. The trigger is unknown at deployment and is
//! bound once liquidity exists, together with the rate.
//!
//! ## Proceeds Split
//!
//! ```text
//! to_b = floor(proceeds × beneficiary_b_share_bps / 10000)
//! to_a = proceeds − to_b
//! ```
//!
//! Beneficiary A absorbs the rounding remainder so no unit is lost.

use crate::{
    error::TokenError,
    ledger::{AccountId, Amount},
    math::mul_div_floor,
};

/// Fee rate in basis points (1/10000).
///
/// 10000 = 100%, 100 = 1%, 1 = 0.01%
pub type FeeRateBps = u32;

/// Basis points in 100%.
pub const BPS_SCALE: FeeRateBps = 10_000;

/// Even split between the two beneficiaries.
pub const DEFAULT_BENEFICIARY_B_SHARE_BPS: FeeRateBps = 5_000;

/// Fee trigger, rate, liquidation threshold and payout beneficiaries.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeePolicy {
    /// Account whose incoming transfers are taxed. `None` until the pool
    /// exists.
    pub fee_trigger: Option<AccountId>,

    /// Fee rate on sells. Must be below [`BPS_SCALE`].
    pub fee_rate_bps: FeeRateBps,

    /// Reserve balance at which the reserve is converted.
    pub liquidation_threshold: Amount,

    /// First payout beneficiary (development). Receives the remainder.
    pub beneficiary_a: AccountId,

    /// Second payout beneficiary (marketing).
    pub beneficiary_b: AccountId,

    /// Share of proceeds paid to beneficiary B.
    /// Default: 5000 bps (even split)
    pub beneficiary_b_share_bps: FeeRateBps,
}

impl FeePolicy {
    /// Policy with no trigger bound yet and an even proceeds split.
    pub fn new(
        beneficiary_a: AccountId,
        beneficiary_b: AccountId,
        liquidation_threshold: Amount,
    ) -> Self {
        Self {
            fee_trigger: None,
            fee_rate_bps: 0,
            liquidation_threshold,
            beneficiary_a,
            beneficiary_b,
            beneficiary_b_share_bps: DEFAULT_BENEFICIARY_B_SHARE_BPS,
        }
    }

    /// Bind the fee trigger and rate.
    pub fn with_fee_trigger(mut self, trigger: AccountId, rate_bps: FeeRateBps) -> Self {
        self.fee_trigger = Some(trigger);
        self.fee_rate_bps = rate_bps;
        self
    }

    /// Set beneficiary B's share of the proceeds.
    pub fn with_beneficiary_b_share(mut self, share_bps: FeeRateBps) -> Self {
        self.beneficiary_b_share_bps = share_bps;
        self
    }

    /// Check rate and share bounds.
    pub fn validate(&self) -> Result<(), TokenError> {
        validate_rate(self.fee_rate_bps)?;
        if self.beneficiary_b_share_bps > BPS_SCALE {
            return Err(TokenError::InvalidShare(self.beneficiary_b_share_bps));
        }
        Ok(())
    }

    /// Whether a transfer to `to` is a taxed sell.
    pub fn is_taxed(&self, to: AccountId) -> bool {
        self.fee_rate_bps > 0 && self.fee_trigger == Some(to)
    }

    /// Compute the fee for a taxed transfer.
    ///
    /// # Returns
    /// (fee_amount, delivered_amount)
    pub fn compute_fee(&self, amount: Amount) -> Result<(Amount, Amount), TokenError> {
        let fee = mul_div_floor(amount, self.fee_rate_bps as Amount, BPS_SCALE as Amount)?;
        // rate < 100%, so fee <= amount
        Ok((fee, amount - fee))
    }

    /// Whether a reserve of this size should be converted.
    ///
    /// An empty reserve is never converted, even with a zero threshold.
    pub fn should_liquidate(&self, reserve: Amount) -> bool {
        reserve > 0 && reserve >= self.liquidation_threshold
    }

    /// Split conversion proceeds.
    ///
    /// # Returns
    /// (to_beneficiary_a, to_beneficiary_b)
    pub fn split_proceeds(&self, proceeds: Amount) -> Result<(Amount, Amount), TokenError> {
        let to_b = mul_div_floor(
            proceeds,
            self.beneficiary_b_share_bps as Amount,
            BPS_SCALE as Amount,
        )?;
        Ok((proceeds - to_b, to_b))
    }
}

pub(crate) fn validate_rate(rate_bps: FeeRateBps) -> Result<(), TokenError> {
    if rate_bps >= BPS_SCALE {
        return Err(TokenError::InvalidFeeRate(rate_bps));
    }
    Ok(())
}
