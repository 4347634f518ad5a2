// Copyright (c) 2024 Botho Foundation

//! Account balances with conservation and a rollback journal.

use std::{collections::HashMap, fmt};

use crate::error::TokenError;

/// Quantity in base units (18 decimals).
pub type Amount = u128;

/// Opaque account identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AccountId(pub u64);

impl AccountId {
    /// Create a new account ID.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account#{}", self.0)
    }
}

/// Marker returned by [`Ledger::checkpoint`].
///
/// Must be handed back to either [`Ledger::commit`] or
/// [`Ledger::revert_to`].
#[derive(Debug)]
#[must_use = "a checkpoint must be committed or reverted"]
pub struct Checkpoint(usize);

#[derive(Clone, Debug)]
enum JournalEntry {
    Balance(AccountId, Amount),
    Supply(Amount),
}

/// Mapping of account to balance.
///
/// Units are created only by the genesis allocation (and move in and out
/// through [`Ledger::deposit`] and [`Ledger::withdraw`] for ledgers that
/// track an external asset). Transfers conserve the sum of balances, which
/// always equals [`Ledger::total_supply`].
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    balances: HashMap<AccountId, Amount>,
    total_supply: Amount,
    journal: Vec<JournalEntry>,
    open_checkpoints: usize,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger holding the given genesis allocation.
    pub fn with_genesis<I>(allocations: I) -> Result<Self, TokenError>
    where
        I: IntoIterator<Item = (AccountId, Amount)>,
    {
        let mut ledger = Self::new();
        for (account, amount) in allocations {
            ledger.deposit(account, amount)?;
        }
        Ok(ledger)
    }

    /// Get the balance of an account (zero if unknown).
    pub fn balance_of(&self, account: AccountId) -> Amount {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// Total units in existence.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Iterate over all accounts with a non-zero balance.
    pub fn iter(&self) -> impl Iterator<Item = (AccountId, Amount)> + '_ {
        self.balances.iter().map(|(&k, &v)| (k, v))
    }

    /// Number of accounts with a non-zero balance.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Returns true if no account holds a balance.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Checked sum of every balance, for conservation checks.
    pub fn sum_of_balances(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(0 as Amount, |acc, v| acc.checked_add(*v))
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// Both new balances are computed before either is written, so a failure
    /// leaves the ledger untouched.
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account: from,
                available,
                requested: amount,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::ArithmeticOverflow)?;

        self.write_balance(from, available - amount);
        self.write_balance(to, credited);
        Ok(())
    }

    /// Credit units that enter from outside this ledger.
    ///
    /// Increases total supply. The token ledger only calls this for the
    /// genesis allocation; asset ledgers fed by an external source (payouts,
    /// native coin) use it for inflows.
    pub fn deposit(&mut self, account: AccountId, amount: Amount) -> Result<(), TokenError> {
        let credited = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(TokenError::ArithmeticOverflow)?;
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::ArithmeticOverflow)?;

        self.write_balance(account, credited);
        self.write_supply(supply);
        Ok(())
    }

    /// Debit units that leave this ledger for an outside holder.
    ///
    /// Decreases total supply. Only meaningful for asset ledgers, mirroring
    /// [`Ledger::deposit`].
    pub fn withdraw(&mut self, account: AccountId, amount: Amount) -> Result<(), TokenError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account,
                available,
                requested: amount,
            });
        }

        self.write_balance(account, available - amount);
        self.write_supply(self.total_supply - amount);
        Ok(())
    }

    /// Start recording writes so they can be undone.
    ///
    /// Checkpoints nest. The journal is discarded once the outermost one is
    /// committed.
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.open_checkpoints += 1;
        Checkpoint(self.journal.len())
    }

    /// Keep every write made since `checkpoint`.
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        let Checkpoint(_) = checkpoint;
        self.close_checkpoint();
    }

    /// Undo every write made since `checkpoint`.
    pub fn revert_to(&mut self, checkpoint: Checkpoint) {
        let Checkpoint(mark) = checkpoint;
        while self.journal.len() > mark {
            match self.journal.pop() {
                Some(JournalEntry::Balance(account, previous)) => self.set_balance(account, previous),
                Some(JournalEntry::Supply(previous)) => self.total_supply = previous,
                None => break,
            }
        }
        self.close_checkpoint();
    }

    fn close_checkpoint(&mut self) {
        self.open_checkpoints = self.open_checkpoints.saturating_sub(1);
        if self.open_checkpoints == 0 {
            self.journal.clear();
        }
    }

    fn write_balance(&mut self, account: AccountId, balance: Amount) {
        if self.open_checkpoints > 0 {
            let previous = self.balance_of(account);
            self.journal.push(JournalEntry::Balance(account, previous));
        }
        self.set_balance(account, balance);
    }

    fn write_supply(&mut self, supply: Amount) {
        if self.open_checkpoints > 0 {
            self.journal.push(JournalEntry::Supply(self.total_supply));
        }
        self.total_supply = supply;
    }

    fn set_balance(&mut self, account: AccountId, balance: Amount) {
        if balance > 0 {
            self.balances.insert(account, balance);
        } else {
            self.balances.remove(&account);
        }
    }
}
