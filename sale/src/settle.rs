// Copyright (c) 2024 Botho Foundation

//! Atomic purchase settlement shared by both sales.

use tlc_token::{AccountId, Amount, Ledger, Token, TokenError, TransferResult};

use crate::error::SaleError;

/// Accounts taking part in one purchase.
pub(crate) struct Settlement {
    pub buyer: AccountId,
    pub inventory: AccountId,
    pub treasury: AccountId,
}

impl Settlement {
    /// Fail unless `buyer` can fund the whole `payment`.
    pub fn require_funds(&self, payments: &Ledger, payment: Amount) -> Result<(), SaleError> {
        let available = payments.balance_of(self.buyer);
        if available < payment {
            return Err(TokenError::InsufficientBalance {
                account: self.buyer,
                available,
                requested: payment,
            }
            .into());
        }
        Ok(())
    }

    /// Move `spent` to the treasury and `quantity` inventory units to the
    /// buyer. Either both legs happen or neither does.
    pub fn execute(
        &self,
        token: &mut Token,
        payments: &mut Ledger,
        spent: Amount,
        quantity: Amount,
    ) -> Result<TransferResult, SaleError> {
        let checkpoint = payments.checkpoint();

        let settled = payments
            .transfer(self.buyer, self.treasury, spent)
            .and_then(|()| token.apply_transfer(self.inventory, self.buyer, quantity));

        match settled {
            Ok(delivery) => {
                payments.commit(checkpoint);
                Ok(delivery)
            }
            Err(err) => {
                payments.revert_to(checkpoint);
                Err(err.into())
            }
        }
    }
}
