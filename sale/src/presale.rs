// Copyright (c) 2024 Botho Foundation

//! Fixed-price sale with an optional whitelist.

use std::collections::BTreeSet;

use tlc_token::{AccountId, Amount, Ledger, Token};
use tracing::{debug, info};

use crate::{
    auction::PurchaseReceipt, error::SaleError, price::UnitPrice, settle::Settlement,
};

/// Sells inventory held by `inventory` at a single price.
#[derive(Clone, Debug)]
pub struct FixedPriceSale {
    owner: AccountId,
    price: UnitPrice,
    inventory: AccountId,
    treasury: AccountId,
    whitelist_enabled: bool,
    whitelist: BTreeSet<AccountId>,
    total_sold: Amount,
    total_raised: Amount,
}

impl FixedPriceSale {
    /// New sale with the whitelist disabled.
    pub fn new(
        owner: AccountId,
        price: UnitPrice,
        inventory: AccountId,
        treasury: AccountId,
    ) -> Result<Self, SaleError> {
        let price = UnitPrice::new(price.payment, price.quantity)?;
        Ok(Self {
            owner,
            price,
            inventory,
            treasury,
            whitelist_enabled: false,
            whitelist: BTreeSet::new(),
            total_sold: 0,
            total_raised: 0,
        })
    }

    pub fn set_whitelist_enabled(&mut self, caller: AccountId, enabled: bool) -> Result<(), SaleError> {
        self.require_owner(caller)?;
        self.whitelist_enabled = enabled;
        debug!(enabled, "whitelist toggled");
        Ok(())
    }

    pub fn add_to_whitelist(&mut self, caller: AccountId, account: AccountId) -> Result<(), SaleError> {
        self.require_owner(caller)?;
        self.whitelist.insert(account);
        Ok(())
    }

    pub fn remove_from_whitelist(
        &mut self,
        caller: AccountId,
        account: AccountId,
    ) -> Result<(), SaleError> {
        self.require_owner(caller)?;
        self.whitelist.remove(&account);
        Ok(())
    }

    /// Buy `floor(payment / price)` units. The rounding remainder stays with
    /// the buyer.
    pub fn purchase(
        &mut self,
        token: &mut Token,
        payments: &mut Ledger,
        buyer: AccountId,
        payment: Amount,
    ) -> Result<PurchaseReceipt, SaleError> {
        if payment == 0 {
            return Err(SaleError::ZeroPayment);
        }
        if !self.is_allowed(buyer) {
            return Err(SaleError::NotWhitelisted(buyer));
        }

        let settlement = Settlement {
            buyer,
            inventory: self.inventory,
            treasury: self.treasury,
        };
        settlement.require_funds(payments, payment)?;

        let quantity = self.price.quantity_for(payment)?;
        if quantity == 0 {
            return Err(SaleError::PaymentBelowMinimumUnit {
                payment,
                minimum: self.price.minimum_payment()?,
            });
        }
        let spent = self.price.cost(quantity)?;

        let total_sold = self
            .total_sold
            .checked_add(quantity)
            .ok_or(SaleError::ArithmeticOverflow)?;
        let total_raised = self
            .total_raised
            .checked_add(spent)
            .ok_or(SaleError::ArithmeticOverflow)?;

        let delivery = settlement.execute(token, payments, spent, quantity)?;
        self.total_sold = total_sold;
        self.total_raised = total_raised;

        info!(buyer = %buyer, payment, quantity, "presale purchase");

        Ok(PurchaseReceipt {
            buyer,
            payment,
            quantity,
            delivered: delivery.delivered,
            spent,
            refund: payment - spent,
        })
    }

    /// Whether `account` may buy right now.
    pub fn is_allowed(&self, account: AccountId) -> bool {
        !self.whitelist_enabled || self.whitelist.contains(&account)
    }

    fn require_owner(&self, caller: AccountId) -> Result<(), SaleError> {
        if caller != self.owner {
            return Err(SaleError::Unauthorized(caller));
        }
        Ok(())
    }

    pub fn price(&self) -> UnitPrice {
        self.price
    }

    pub fn whitelist_enabled(&self) -> bool {
        self.whitelist_enabled
    }

    pub fn inventory_account(&self) -> AccountId {
        self.inventory
    }

    pub fn treasury(&self) -> AccountId {
        self.treasury
    }

    pub fn total_sold(&self) -> Amount {
        self.total_sold
    }

    pub fn total_raised(&self) -> Amount {
        self.total_raised
    }
}
