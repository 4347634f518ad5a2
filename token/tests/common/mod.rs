// Copyright (c) 2024 Botho Foundation
//
//! Shared fixtures for the fee engine integration tests.

#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use tlc_token::{
    AccountId, Amount, ExchangeError, ExchangeService, FeePolicy, Token, UNIT,
};

pub const TOKEN: AccountId = AccountId::new(1);
pub const OWNER: AccountId = AccountId::new(2);
pub const DEV: AccountId = AccountId::new(3);
pub const MARKETING: AccountId = AccountId::new(4);
pub const PAIR: AccountId = AccountId::new(5);
pub const ALICE: AccountId = AccountId::new(6);
pub const BOB: AccountId = AccountId::new(7);

pub const FEE_RATE_BPS: u32 = 400;
pub const THRESHOLD: Amount = 100 * UNIT;

/// One conversion seen by a mock exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversion {
    pub holder: AccountId,
    pub units: Amount,
    pub was_liquidating: bool,
}

/// Shared log of conversions, readable after the token owns the exchange.
pub type ConversionLog = Rc<RefCell<Vec<Conversion>>>;

/// Pulls the units into [`PAIR`] and pays `numerator / denominator` of them.
pub struct FixedRateExchange {
    pub numerator: Amount,
    pub denominator: Amount,
    pub log: ConversionLog,
    /// When set, also tries a sell into the pair from inside the conversion.
    pub nested_sell: Option<(AccountId, Amount)>,
}

impl FixedRateExchange {
    pub fn new(numerator: Amount, denominator: Amount) -> (Self, ConversionLog) {
        let log = ConversionLog::default();
        let exchange = Self {
            numerator,
            denominator,
            log: log.clone(),
            nested_sell: None,
        };
        (exchange, log)
    }
}

impl ExchangeService for FixedRateExchange {
    fn convert_to_reserve_asset(
        &mut self,
        token: &mut Token,
        holder: AccountId,
        units: Amount,
    ) -> Result<Amount, ExchangeError> {
        self.log.borrow_mut().push(Conversion {
            holder,
            units,
            was_liquidating: token.is_liquidating(),
        });

        token.apply_transfer(holder, PAIR, units)?;
        if let Some((seller, amount)) = self.nested_sell {
            token.apply_transfer(seller, PAIR, amount)?;
        }
        Ok(units * self.numerator / self.denominator)
    }
}

/// Pulls the units, then reports a routing failure.
pub struct FailingExchange {
    pub log: ConversionLog,
}

impl ExchangeService for FailingExchange {
    fn convert_to_reserve_asset(
        &mut self,
        token: &mut Token,
        holder: AccountId,
        units: Amount,
    ) -> Result<Amount, ExchangeError> {
        self.log.borrow_mut().push(Conversion {
            holder,
            units,
            was_liquidating: token.is_liquidating(),
        });
        token.apply_transfer(holder, PAIR, units)?;
        Err(ExchangeError::Unavailable("no route".to_string()))
    }
}

/// Launch fee policy: 4% on sells, threshold 100.
pub fn policy() -> FeePolicy {
    FeePolicy::new(DEV, MARKETING, THRESHOLD).with_fee_trigger(PAIR, FEE_RATE_BPS)
}

/// Token with Alice and Bob funded and no exchange attached.
pub fn funded_token() -> Token {
    Token::new(
        TOKEN,
        OWNER,
        policy(),
        [
            (OWNER, 1_000_000 * UNIT),
            (ALICE, 5_000 * UNIT),
            (BOB, 5_000 * UNIT),
        ],
    )
    .expect("valid genesis")
}

/// Sum of all token balances, which must equal total supply.
pub fn sum_of_balances(token: &Token) -> Amount {
    token.ledger().sum_of_balances().expect("no overflow")
}
