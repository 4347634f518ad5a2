// Copyright (c) 2024 Botho Foundation

//! Interface to the venue that converts fee units into the reserve asset.

use thiserror::Error;

use crate::{
    error::TokenError,
    ledger::{AccountId, Amount},
    token::Token,
};

/// Converts token units into the reserve asset.
///
/// The service is handed the token itself so it can pull the units out of
/// `holder` with ordinary [`Token::apply_transfer`] calls. Those calls happen
/// while the token is liquidating and are therefore never taxed and never
/// start a second liquidation.
pub trait ExchangeService {
    /// Sell `units` held by `holder` and return the reserve-asset proceeds.
    fn convert_to_reserve_asset(
        &mut self,
        token: &mut Token,
        holder: AccountId,
        units: Amount,
    ) -> Result<Amount, ExchangeError>;

    /// Undo the conversion that just returned `Ok`.
    ///
    /// Called when the token could not credit the proceeds and has reverted
    /// its own ledger writes, including the units the service pulled. A
    /// service that keeps reserves of its own must restore them here.
    fn revert_conversion(&mut self) {}
}

/// Errors an exchange can report back to the token.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// Routing or venue failure.
    #[error("exchange unavailable: {0}")]
    Unavailable(String),

    /// The pool cannot produce any output for this input.
    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    /// A token transfer made by the exchange failed.
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<ExchangeError> for TokenError {
    /// A failed conversion, as the token reports it.
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::Unavailable(reason) => TokenError::ExchangeUnavailable(reason),
            other => TokenError::ExchangeUnavailable(other.to_string()),
        }
    }
}
