// Copyright (c) 2024 Botho Foundation

use thiserror::Error;
use tlc_token::{AccountId, Amount, TokenError};

/// Errors raised by the sales.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SaleError {
    /// Rejected at configuration time.
    #[error("invalid cliff schedule: {0}")]
    InvalidCliffSchedule(String),

    /// A price with a zero payment or zero quantity.
    #[error("invalid price {payment}/{quantity}")]
    InvalidPrice { payment: Amount, quantity: Amount },

    #[error("payment must be non-zero")]
    ZeroPayment,

    /// Every tier is sold out.
    #[error("no inventory available")]
    NoInventoryAvailable,

    /// The payment cannot buy a single unit at the current price.
    #[error("payment {payment} is below the minimum {minimum} for one unit")]
    PaymentBelowMinimumUnit { payment: Amount, minimum: Amount },

    #[error("{0} is not whitelisted")]
    NotWhitelisted(AccountId),

    #[error("{0} is not authorized for this operation")]
    Unauthorized(AccountId),

    /// A running sale total overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// Ledger failure while settling.
    #[error(transparent)]
    Token(#[from] TokenError),
}
