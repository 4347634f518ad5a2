// Copyright (c) 2024 Botho Foundation

//! Constant-product pool pairing the token with the payment asset.
//!
//! ## Pricing
//!
//! ```text
//! in'  = floor(in × (10000 − fee) / 10000)
//! out  = floor(in' × R_out / (R_in + in'))
//! ```
//!
//! Token input of a user sell is measured as the pool's ledger balance minus
//! its recorded reserve, so a taxed sell only swaps what actually arrived.
//!
//! The pool is the token's sell venue and also its exchange: liquidating the
//! fee reserve runs through [`ExchangeService`] while a user sell into the
//! same pool is still in progress. [`SharedPool`] never holds the pool
//! borrow across a token transfer, so the nested conversion can take it.
//! A sell that fails after that conversion ran is undone together with it.

use std::{cell::RefCell, rc::Rc};

use serde::Serialize;
use tlc_token::{
    math::mul_div_floor, AccountId, Amount, ExchangeError, ExchangeService, FeeRateBps, Ledger,
    Token, TokenError, TransferResult, BPS_SCALE,
};
use tracing::debug;

/// Reserves of the pool. The token reserve is also held on the token ledger
/// under `account`; the payment-asset reserve lives only here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConstantProductPool {
    account: AccountId,
    token_reserve: Amount,
    native_reserve: Amount,
    fee_bps: FeeRateBps,
}

/// Outcome of a user swap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SwapReceipt {
    pub trader: AccountId,
    pub amount_in: Amount,
    pub amount_out: Amount,
    /// The token transfer of the swap (fee and liquidation of a sell).
    pub transfer: TransferResult,
}

impl ConstantProductPool {
    pub fn new(account: AccountId, fee_bps: FeeRateBps) -> Result<Self, ExchangeError> {
        if fee_bps >= BPS_SCALE {
            return Err(TokenError::InvalidFeeRate(fee_bps).into());
        }
        Ok(Self {
            account,
            token_reserve: 0,
            native_reserve: 0,
            fee_bps,
        })
    }

    /// Output for `amount_in` against the given reserves.
    pub fn amount_out(
        &self,
        amount_in: Amount,
        reserve_in: Amount,
        reserve_out: Amount,
    ) -> Result<Amount, ExchangeError> {
        if reserve_in == 0 || reserve_out == 0 {
            return Err(ExchangeError::InsufficientLiquidity);
        }
        let in_with_fee = mul_div_floor(
            amount_in,
            (BPS_SCALE - self.fee_bps) as Amount,
            BPS_SCALE as Amount,
        )?;
        let denominator = reserve_in
            .checked_add(in_with_fee)
            .ok_or(TokenError::ArithmeticOverflow)?;
        let out = mul_div_floor(in_with_fee, reserve_out, denominator)?;
        if out == 0 {
            return Err(ExchangeError::InsufficientLiquidity);
        }
        Ok(out)
    }

    /// Swap exactly `amount_in` tokens already on the pool's balance for the
    /// payment asset. Reserves only change on success.
    fn swap_exact_token_input(&mut self, amount_in: Amount) -> Result<Amount, ExchangeError> {
        let out = self.amount_out(amount_in, self.token_reserve, self.native_reserve)?;
        let token_reserve = self
            .token_reserve
            .checked_add(amount_in)
            .ok_or(TokenError::ArithmeticOverflow)?;

        self.token_reserve = token_reserve;
        self.native_reserve -= out;
        debug!(amount_in, out, "pool swapped tokens for payment asset");
        Ok(out)
    }

    /// Swap whatever token balance arrived since the last sync.
    fn swap_token_input(&mut self, token: &Token) -> Result<Amount, ExchangeError> {
        let amount_in = token.balance_of(self.account).saturating_sub(self.token_reserve);
        self.swap_exact_token_input(amount_in)
    }

    /// Seed liquidity. Must run before the pool is bound as fee trigger,
    /// otherwise the deposit is taxed like any other transfer into it.
    pub fn add_liquidity(
        &mut self,
        token: &mut Token,
        natives: &mut Ledger,
        provider: AccountId,
        token_amount: Amount,
        native_amount: Amount,
    ) -> Result<(), ExchangeError> {
        let native_reserve = self
            .native_reserve
            .checked_add(native_amount)
            .ok_or(TokenError::ArithmeticOverflow)?;
        natives.withdraw(provider, native_amount)?;
        if let Err(err) = token.apply_transfer(provider, self.account, token_amount) {
            natives.deposit(provider, native_amount)?;
            return Err(err.into());
        }

        self.token_reserve = token.balance_of(self.account);
        self.native_reserve = native_reserve;
        Ok(())
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn token_reserve(&self) -> Amount {
        self.token_reserve
    }

    pub fn native_reserve(&self) -> Amount {
        self.native_reserve
    }

    pub fn fee_bps(&self) -> FeeRateBps {
        self.fee_bps
    }
}

/// Handle to a pool shared between the router and the token's exchange slot.
#[derive(Clone, Debug)]
pub struct SharedPool {
    pool: Rc<RefCell<ConstantProductPool>>,

    /// Reserves before the last conversion made through this handle.
    before_conversion: Option<ConstantProductPool>,
}

impl SharedPool {
    pub fn new(pool: ConstantProductPool) -> Self {
        Self {
            pool: Rc::new(RefCell::new(pool)),
            before_conversion: None,
        }
    }

    pub fn snapshot(&self) -> ConstantProductPool {
        self.pool.borrow().clone()
    }

    pub fn account(&self) -> AccountId {
        self.pool.borrow().account
    }

    fn restore(&self, saved: ConstantProductPool) {
        *self.pool.borrow_mut() = saved;
    }

    pub fn add_liquidity(
        &self,
        token: &mut Token,
        natives: &mut Ledger,
        provider: AccountId,
        token_amount: Amount,
        native_amount: Amount,
    ) -> Result<(), ExchangeError> {
        self.pool
            .borrow_mut()
            .add_liquidity(token, natives, provider, token_amount, native_amount)
    }

    /// Sell `amount` tokens for the payment asset, like a router swap that
    /// supports fee-on-transfer tokens.
    ///
    /// The sell is all or nothing. When the swap cannot be made, the
    /// transfer, its fee and any liquidation it triggered are undone and the
    /// reserves are restored.
    pub fn sell(
        &self,
        token: &mut Token,
        natives: &mut Ledger,
        seller: AccountId,
        amount: Amount,
    ) -> Result<SwapReceipt, ExchangeError> {
        let saved = self.snapshot();
        let checkpoint = token.checkpoint();

        match self.settle_sell(token, natives, seller, amount) {
            Ok(receipt) => {
                token.commit(checkpoint);
                Ok(receipt)
            }
            Err(err) => {
                token.revert_to(checkpoint);
                self.restore(saved);
                debug!(seller = %seller, amount, error = %err, "sell undone");
                Err(err)
            }
        }
    }

    fn settle_sell(
        &self,
        token: &mut Token,
        natives: &mut Ledger,
        seller: AccountId,
        amount: Amount,
    ) -> Result<SwapReceipt, ExchangeError> {
        // the pool is not borrowed here: this transfer may liquidate through it
        let transfer = token.apply_transfer(seller, self.account(), amount)?;

        let amount_out = self.pool.borrow_mut().swap_token_input(token)?;
        natives.deposit(seller, amount_out)?;

        Ok(SwapReceipt {
            trader: seller,
            amount_in: amount,
            amount_out,
            transfer,
        })
    }

    /// Buy tokens with `payment` of the payment asset. Untaxed: the fee only
    /// applies to transfers into the pool.
    pub fn buy(
        &self,
        token: &mut Token,
        natives: &mut Ledger,
        buyer: AccountId,
        payment: Amount,
    ) -> Result<SwapReceipt, ExchangeError> {
        let mut pool = self.pool.borrow_mut();
        let amount_out = pool.amount_out(payment, pool.native_reserve, pool.token_reserve)?;
        let native_reserve = pool
            .native_reserve
            .checked_add(payment)
            .ok_or(TokenError::ArithmeticOverflow)?;

        natives.withdraw(buyer, payment)?;
        let transfer = match token.apply_transfer(pool.account, buyer, amount_out) {
            Ok(transfer) => transfer,
            Err(err) => {
                natives.deposit(buyer, payment)?;
                return Err(err.into());
            }
        };

        pool.native_reserve = native_reserve;
        pool.token_reserve = token.balance_of(pool.account);

        Ok(SwapReceipt {
            trader: buyer,
            amount_in: payment,
            amount_out,
            transfer,
        })
    }
}

impl ExchangeService for SharedPool {
    fn convert_to_reserve_asset(
        &mut self,
        token: &mut Token,
        holder: AccountId,
        units: Amount,
    ) -> Result<Amount, ExchangeError> {
        let account = self.account();
        let before = token.balance_of(account);
        token.apply_transfer(holder, account, units)?;
        // a sell in progress may already have delivered into the pool, so
        // only the pulled units are swapped
        let arrived = token.balance_of(account).saturating_sub(before);

        let mut pool = self
            .pool
            .try_borrow_mut()
            .map_err(|_| ExchangeError::Unavailable("pool is busy".to_string()))?;
        let saved = pool.clone();
        let out = pool.swap_exact_token_input(arrived)?;
        self.before_conversion = Some(saved);
        Ok(out)
    }

    fn revert_conversion(&mut self) {
        if let Some(saved) = self.before_conversion.take() {
            self.restore(saved);
        }
    }
}
