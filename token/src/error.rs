// Copyright (c) 2024 Botho Foundation

//! Errors raised by the ledger and the fee engine.

use thiserror::Error;

use crate::ledger::{AccountId, Amount};

/// Errors that can occur while moving or configuring token balances.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Sender doesn't have enough balance.
    #[error("insufficient balance in {account}: have {available}, need {requested}")]
    InsufficientBalance {
        account: AccountId,
        available: Amount,
        requested: Amount,
    },

    /// A checked add, multiply or narrowing conversion overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// Fee rate must stay strictly below 100%.
    #[error("fee rate {0} bps must be below 10000")]
    InvalidFeeRate(u32),

    /// Beneficiary share above 100%.
    #[error("beneficiary share {0} bps exceeds 10000")]
    InvalidShare(u32),

    /// Caller is not the token owner.
    #[error("{0} is not authorized for this operation")]
    Unauthorized(AccountId),

    /// The reserve could not be converted.
    #[error("exchange unavailable: {0}")]
    ExchangeUnavailable(String),
}
