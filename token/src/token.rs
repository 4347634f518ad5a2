// Copyright (c) 2024 Botho Foundation

//! Transfer interception, fee withholding and reserve liquidation.

use std::fmt;

use tracing::{debug, info, warn};

use crate::{
    error::TokenError,
    exchange::ExchangeService,
    ledger::{AccountId, Amount, Checkpoint, Ledger},
    policy::{validate_rate, FeePolicy, FeeRateBps},
};

/// Result of a transfer operation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransferResult {
    /// Fee withheld into the reserve.
    pub fee: Amount,

    /// Amount received by the recipient after the fee.
    pub delivered: Amount,

    /// Fee rate that was applied (basis points).
    pub fee_rate_bps: FeeRateBps,

    /// Set when this transfer pushed the reserve over the threshold.
    pub liquidation: Option<LiquidationOutcome>,
}

impl TransferResult {
    fn untaxed(amount: Amount) -> Self {
        Self {
            fee: 0,
            delivered: amount,
            fee_rate_bps: 0,
            liquidation: None,
        }
    }
}

/// What happened to the reserve during a liquidation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
pub enum LiquidationOutcome {
    /// The reserve was sold and the proceeds paid out.
    Converted {
        /// Units that left the reserve.
        units: Amount,
        /// Reserve-asset proceeds.
        proceeds: Amount,
        /// Paid to beneficiary A.
        to_a: Amount,
        /// Paid to beneficiary B.
        to_b: Amount,
    },

    /// The exchange failed. The reserve is intact and will be offered again
    /// on the next taxed transfer.
    Failed { units: Amount, reason: String },
}

/// Running totals of the fee engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeeStats {
    /// Fee units withheld all time.
    pub total_withheld: Amount,

    /// Successful liquidations.
    pub liquidations: u64,

    /// Liquidations that failed and were rolled back.
    pub failed_liquidations: u64,

    /// Units converted all time.
    pub total_liquidated_units: Amount,

    /// Reserve-asset proceeds paid out all time.
    pub total_proceeds: Amount,
}

/// Marker returned by [`Token::checkpoint`].
///
/// Covers both balance ledgers and the fee statistics, so a revert also
/// undoes any liquidation that ran in between.
#[derive(Debug)]
#[must_use = "a checkpoint must be committed or reverted"]
pub struct TokenCheckpoint {
    ledger: Checkpoint,
    payouts: Checkpoint,
    stats: FeeStats,
}

/// Token ledger with a sell fee and automatic reserve conversion.
pub struct Token {
    /// The token's own account; holds the fee reserve.
    account: AccountId,

    /// May rebind the fee trigger and exchange.
    owner: AccountId,

    policy: FeePolicy,

    ledger: Ledger,

    /// Reserve-asset balances paid out to beneficiaries.
    payouts: Ledger,

    /// Taken out of the slot for the duration of a conversion.
    exchange: Option<Box<dyn ExchangeService>>,

    /// Single-flight guard, set only while the exchange is running.
    liquidating: bool,

    stats: FeeStats,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("account", &self.account)
            .field("owner", &self.owner)
            .field("policy", &self.policy)
            .field("total_supply", &self.ledger.total_supply())
            .field("reserve", &self.reserve_balance())
            .field("has_exchange", &self.exchange.is_some())
            .field("liquidating", &self.liquidating)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Token {
    /// Deploy a token, minting the genesis allocation.
    pub fn new<I>(
        account: AccountId,
        owner: AccountId,
        policy: FeePolicy,
        genesis: I,
    ) -> Result<Self, TokenError>
    where
        I: IntoIterator<Item = (AccountId, Amount)>,
    {
        policy.validate()?;
        let ledger = Ledger::with_genesis(genesis)?;

        info!(
            account = %account,
            supply = ledger.total_supply(),
            threshold = policy.liquidation_threshold,
            "token deployed"
        );

        Ok(Self {
            account,
            owner,
            policy,
            ledger,
            payouts: Ledger::new(),
            exchange: None,
            liquidating: false,
            stats: FeeStats::default(),
        })
    }

    /// Attach the exchange used for liquidation.
    pub fn with_exchange(mut self, exchange: Box<dyn ExchangeService>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    /// Replace the exchange. Owner only.
    pub fn set_exchange(
        &mut self,
        caller: AccountId,
        exchange: Box<dyn ExchangeService>,
    ) -> Result<(), TokenError> {
        self.require_owner(caller)?;
        self.exchange = Some(exchange);
        Ok(())
    }

    /// Bind the fee trigger and rate once the sell venue is known. Owner only.
    pub fn set_fee_trigger(
        &mut self,
        caller: AccountId,
        trigger: Option<AccountId>,
        rate_bps: FeeRateBps,
    ) -> Result<(), TokenError> {
        self.require_owner(caller)?;
        validate_rate(rate_bps)?;
        self.policy.fee_trigger = trigger;
        self.policy.fee_rate_bps = rate_bps;

        info!(trigger = ?trigger, rate_bps, "fee trigger updated");
        Ok(())
    }

    /// Move `amount` from `from` to `to`, taxing sells.
    ///
    /// This is the core operation that:
    /// 1. Withholds the fee if `to` is the fee trigger
    /// 2. Credits the remainder to `to`
    /// 3. Converts the reserve if the withheld fee pushed it over the threshold
    ///
    /// Transfers issued while the reserve is being converted are ordinary.
    /// A failed conversion does not fail the transfer.
    pub fn apply_transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<TransferResult, TokenError> {
        if self.liquidating || !self.policy.is_taxed(to) {
            self.ledger.transfer(from, to, amount)?;
            return Ok(TransferResult::untaxed(amount));
        }

        let (fee, delivered) = self.policy.compute_fee(amount)?;
        self.withhold(from, to, fee, delivered)?;
        self.stats.total_withheld = self.stats.total_withheld.saturating_add(fee);

        debug!(
            from = %from,
            fee,
            delivered,
            reserve = self.reserve_balance(),
            "sell fee withheld"
        );

        let liquidation = if self.policy.should_liquidate(self.reserve_balance()) {
            Some(self.liquidate())
        } else {
            None
        };

        Ok(TransferResult {
            fee,
            delivered,
            fee_rate_bps: self.policy.fee_rate_bps,
            liquidation,
        })
    }

    /// Start recording token state so a multi-step operation built on
    /// [`Token::apply_transfer`] can be undone as a whole.
    pub fn checkpoint(&mut self) -> TokenCheckpoint {
        TokenCheckpoint {
            ledger: self.ledger.checkpoint(),
            payouts: self.payouts.checkpoint(),
            stats: self.stats.clone(),
        }
    }

    /// Keep everything done since `checkpoint`.
    pub fn commit(&mut self, checkpoint: TokenCheckpoint) {
        self.ledger.commit(checkpoint.ledger);
        self.payouts.commit(checkpoint.payouts);
    }

    /// Undo every transfer, fee and payout made since `checkpoint`.
    ///
    /// State held by the exchange is not covered.
    pub fn revert_to(&mut self, checkpoint: TokenCheckpoint) {
        self.ledger.revert_to(checkpoint.ledger);
        self.payouts.revert_to(checkpoint.payouts);
        self.stats = checkpoint.stats;
    }

    /// Debit `fee + delivered` from `from` and credit both legs, atomically.
    fn withhold(
        &mut self,
        from: AccountId,
        to: AccountId,
        fee: Amount,
        delivered: Amount,
    ) -> Result<(), TokenError> {
        let requested = fee + delivered;
        let available = self.ledger.balance_of(from);
        if available < requested {
            return Err(TokenError::InsufficientBalance {
                account: from,
                available,
                requested,
            });
        }

        let checkpoint = self.ledger.checkpoint();
        let result = self
            .ledger
            .transfer(from, to, delivered)
            .and_then(|()| self.ledger.transfer(from, self.account, fee));

        match result {
            Ok(()) => {
                self.ledger.commit(checkpoint);
                Ok(())
            }
            Err(err) => {
                self.ledger.revert_to(checkpoint);
                Err(err)
            }
        }
    }

    /// Sell the whole reserve and pay out the proceeds.
    ///
    /// Every ledger write made by the exchange is reverted if the conversion
    /// or the payout fails.
    fn liquidate(&mut self) -> LiquidationOutcome {
        let units = self.reserve_balance();

        let Some(mut exchange) = self.exchange.take() else {
            let err = TokenError::ExchangeUnavailable("no exchange attached".to_string());
            return self.liquidation_failed(units, err.to_string());
        };

        let holder = self.account;
        self.liquidating = true;
        let checkpoint = self.ledger.checkpoint();
        let converted = exchange.convert_to_reserve_asset(self, holder, units);
        self.liquidating = false;

        let outcome = match converted {
            Ok(proceeds) => self.pay_out(units, proceeds).map_err(|err| {
                exchange.revert_conversion();
                err.to_string()
            }),
            Err(err) => Err(TokenError::from(err).to_string()),
        };
        self.exchange = Some(exchange);

        match outcome {
            Ok(outcome) => {
                self.ledger.commit(checkpoint);
                outcome
            }
            Err(reason) => {
                self.ledger.revert_to(checkpoint);
                self.liquidation_failed(units, reason)
            }
        }
    }

    fn pay_out(&mut self, offered: Amount, proceeds: Amount) -> Result<LiquidationOutcome, TokenError> {
        let units = offered.saturating_sub(self.reserve_balance());
        let (to_a, to_b) = self.policy.split_proceeds(proceeds)?;

        let checkpoint = self.payouts.checkpoint();
        let paid = self
            .payouts
            .deposit(self.policy.beneficiary_a, to_a)
            .and_then(|()| self.payouts.deposit(self.policy.beneficiary_b, to_b));
        if let Err(err) = paid {
            self.payouts.revert_to(checkpoint);
            return Err(err);
        }
        self.payouts.commit(checkpoint);

        self.stats.liquidations += 1;
        self.stats.total_liquidated_units = self.stats.total_liquidated_units.saturating_add(units);
        self.stats.total_proceeds = self.stats.total_proceeds.saturating_add(proceeds);

        info!(units, proceeds, to_a, to_b, "fee reserve liquidated");

        Ok(LiquidationOutcome::Converted {
            units,
            proceeds,
            to_a,
            to_b,
        })
    }

    fn liquidation_failed(&mut self, units: Amount, reason: String) -> LiquidationOutcome {
        self.stats.failed_liquidations += 1;
        warn!(units, reason = %reason, "fee reserve liquidation failed, reserve kept");
        LiquidationOutcome::Failed { units, reason }
    }

    fn require_owner(&self, caller: AccountId) -> Result<(), TokenError> {
        if caller != self.owner {
            return Err(TokenError::Unauthorized(caller));
        }
        Ok(())
    }

    /// Get the token balance of an account.
    pub fn balance_of(&self, account: AccountId) -> Amount {
        self.ledger.balance_of(account)
    }

    /// Total units in existence.
    pub fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }

    /// Units currently held in the fee reserve.
    pub fn reserve_balance(&self) -> Amount {
        self.ledger.balance_of(self.account)
    }

    /// The token's own account, which holds the fee reserve.
    pub fn reserve_account(&self) -> AccountId {
        self.account
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn policy(&self) -> &FeePolicy {
        &self.policy
    }

    pub fn stats(&self) -> &FeeStats {
        &self.stats
    }

    /// True only while the exchange is converting the reserve.
    pub fn is_liquidating(&self) -> bool {
        self.liquidating
    }

    /// Reserve-asset amount paid out to `account` so far.
    pub fn reserve_asset_balance(&self, account: AccountId) -> Amount {
        self.payouts.balance_of(account)
    }

    /// Read-only view of the token ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}
