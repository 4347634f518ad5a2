// Copyright (c) 2024 Botho Foundation

//! TLC token ledger with a self-funding sell fee.
//!
//! Every balance movement goes through [`Token::apply_transfer`]. Transfers
//! into the designated sell venue (the liquidity pool) are taxed; the tax is
//! kept in-kind under the token's own account (the *fee reserve*) and, once
//! the reserve crosses a threshold, sold through an [`ExchangeService`] for
//! the reserve asset, which is split between two beneficiaries.
//!
//! ## Transfer kinds
//!
//! | Kind      | Condition                        | Fee                        |
//! |-----------|----------------------------------|----------------------------|
//! | Ordinary  | `to` is not the fee trigger      | none                       |
//! | Sell      | `to` is the fee trigger          | `floor(amount * bps / 1e4)`|
//! | Nested    | issued while liquidating         | none, never re-liquidates  |
//!
//! ## Key Concepts
//!
//! - **Fee reserve**: the token's own ledger balance. Still part of total
//!   supply until converted; nothing is burned.
//! - **Liquidation**: converting the whole reserve through the exchange and
//!   paying out the proceeds. Best effort: a failed conversion is rolled back
//!   and never blocks the transfer that triggered it.
//! - **Single-flight guard**: the exchange moves tokens through this same
//!   ledger while converting. Those nested transfers see the `liquidating`
//!   flag and are applied as ordinary transfers.

pub mod math;
pub mod units;

mod error;
mod exchange;
mod ledger;
mod policy;
mod token;

pub use error::TokenError;
pub use exchange::{ExchangeError, ExchangeService};
pub use ledger::{AccountId, Amount, Checkpoint, Ledger};
pub use policy::{FeePolicy, FeeRateBps, BPS_SCALE, DEFAULT_BENEFICIARY_B_SHARE_BPS};
pub use token::{FeeStats, LiquidationOutcome, Token, TokenCheckpoint, TransferResult};
pub use units::{format_units, parse_units, UnitsError, TOKEN_DECIMALS, UNIT};
