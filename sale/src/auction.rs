// Copyright (c) 2024 Botho Foundation

//! Tiered-price auction.

use tlc_token::{AccountId, Amount, Ledger, Token};
use tracing::info;

use crate::{
    cliff::{PriceCliffTable, Quote},
    error::SaleError,
    settle::Settlement,
};

/// Outcome of a successful purchase.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PurchaseReceipt {
    pub buyer: AccountId,
    pub payment: Amount,
    /// Inventory units sold.
    pub quantity: Amount,
    /// Units that reached the buyer's balance.
    pub delivered: Amount,
    /// Payment moved to the treasury.
    pub spent: Amount,
    /// Payment that stayed with the buyer.
    pub refund: Amount,
}

/// Sells inventory held by `inventory` at escalating cliff prices.
#[derive(Clone, Debug)]
pub struct Auction {
    table: PriceCliffTable,
    inventory: AccountId,
    treasury: AccountId,
    total_sold: Amount,
    total_raised: Amount,
    purchases: u64,
}

impl Auction {
    pub fn new(table: PriceCliffTable, inventory: AccountId, treasury: AccountId) -> Self {
        Self {
            table,
            inventory,
            treasury,
            total_sold: 0,
            total_raised: 0,
            purchases: 0,
        }
    }

    /// Buy as much inventory as `payment` affords.
    ///
    /// The quote is taken first and only committed to the cliff table after
    /// payment and inventory have both moved, so any failure leaves the
    /// table, the token and the payment ledger as they were.
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

        let settlement = Settlement {
            buyer,
            inventory: self.inventory,
            treasury: self.treasury,
        };
        settlement.require_funds(payments, payment)?;

        let quote = self.quote(payment)?;
        if quote.quantity == 0 {
            return Err(self.nothing_to_sell(payment)?);
        }

        let total_sold = self
            .total_sold
            .checked_add(quote.quantity)
            .ok_or(SaleError::ArithmeticOverflow)?;
        let total_raised = self
            .total_raised
            .checked_add(quote.spent)
            .ok_or(SaleError::ArithmeticOverflow)?;

        let delivery = settlement.execute(token, payments, quote.spent, quote.quantity)?;

        self.table.commit(&quote);
        self.total_sold = total_sold;
        self.total_raised = total_raised;
        self.purchases += 1;

        info!(
            buyer = %buyer,
            payment,
            quantity = quote.quantity,
            refund = quote.leftover,
            cursor = self.table.cursor(),
            "auction purchase"
        );

        Ok(PurchaseReceipt {
            buyer,
            payment,
            quantity: quote.quantity,
            delivered: delivery.delivered,
            spent: quote.spent,
            refund: quote.leftover,
        })
    }

    /// Inventory units `payment` would buy right now. Side-effect free.
    pub fn expected_return(&self, payment: Amount) -> Result<Amount, SaleError> {
        Ok(self.quote(payment)?.quantity)
    }

    /// Full per-cliff breakdown of what `payment` would buy right now.
    pub fn quote(&self, payment: Amount) -> Result<Quote, SaleError> {
        self.table.quote(payment)
    }

    fn nothing_to_sell(&self, payment: Amount) -> Result<SaleError, SaleError> {
        Ok(match self.table.current() {
            None => SaleError::NoInventoryAvailable,
            Some(cliff) => SaleError::PaymentBelowMinimumUnit {
                payment,
                minimum: cliff.price().minimum_payment()?,
            },
        })
    }

    pub fn table(&self) -> &PriceCliffTable {
        &self.table
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

    pub fn purchases(&self) -> u64 {
        self.purchases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cliff::CliffSpec, price::UnitPrice};
    use tlc_token::{FeePolicy, TokenError};

    const TOKEN: AccountId = AccountId::new(1);
    const OWNER: AccountId = AccountId::new(2);
    const AUCTION: AccountId = AccountId::new(3);
    const TREASURY: AccountId = AccountId::new(4);
    const BUYER: AccountId = AccountId::new(5);

    fn setup(inventory: Amount) -> (Auction, Token, Ledger) {
        let table = PriceCliffTable::new(vec![
            CliffSpec { capacity: 100, price: UnitPrice::new(1, 1).unwrap() },
            CliffSpec { capacity: 50, price: UnitPrice::new(2, 1).unwrap() },
        ])
        .unwrap();
        let policy = FeePolicy::new(OWNER, OWNER, 1_000);
        let token = Token::new(TOKEN, OWNER, policy, [(AUCTION, inventory)]).unwrap();
        let payments = Ledger::with_genesis([(BUYER, 1_000)]).unwrap();
        (Auction::new(table, AUCTION, TREASURY), token, payments)
    }

    #[test]
    fn test_purchase_settles_and_refunds() {
        let (mut auction, mut token, mut payments) = setup(150);
        let receipt = auction.purchase(&mut token, &mut payments, BUYER, 121).unwrap();

        assert_eq!(receipt.quantity, 110);
        assert_eq!(receipt.delivered, 110);
        assert_eq!(receipt.spent, 120);
        assert_eq!(receipt.refund, 1);
        assert_eq!(token.balance_of(BUYER), 110);
        assert_eq!(payments.balance_of(TREASURY), 120);
        assert_eq!(payments.balance_of(BUYER), 880);
        assert_eq!(auction.table().cursor(), 1);
        assert_eq!(auction.total_raised(), 120);
    }

    #[test]
    fn test_zero_payment() {
        let (mut auction, mut token, mut payments) = setup(150);
        assert_eq!(
            auction.purchase(&mut token, &mut payments, BUYER, 0),
            Err(SaleError::ZeroPayment)
        );
    }

    #[test]
    fn test_below_minimum_unit() {
        let (mut auction, mut token, mut payments) = setup(150);
        auction.purchase(&mut token, &mut payments, BUYER, 100).unwrap();

        assert_eq!(
            auction.purchase(&mut token, &mut payments, BUYER, 1),
            Err(SaleError::PaymentBelowMinimumUnit { payment: 1, minimum: 2 })
        );
        assert_eq!(payments.balance_of(BUYER), 900);
    }

    #[test]
    fn test_sold_out() {
        let (mut auction, mut token, mut payments) = setup(150);
        auction.purchase(&mut token, &mut payments, BUYER, 500).unwrap();

        assert_eq!(
            auction.purchase(&mut token, &mut payments, BUYER, 10),
            Err(SaleError::NoInventoryAvailable)
        );
        assert_eq!(payments.balance_of(BUYER), 800);
    }

    #[test]
    fn test_unfunded_buyer() {
        let (mut auction, mut token, mut payments) = setup(150);
        let err = auction.purchase(&mut token, &mut payments, BUYER, 1_001).unwrap_err();
        assert!(matches!(err, SaleError::Token(TokenError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_failed_delivery_changes_nothing() {
        // auction account holds less than the table promises
        let (mut auction, mut token, mut payments) = setup(10);
        let err = auction.purchase(&mut token, &mut payments, BUYER, 50).unwrap_err();

        assert!(matches!(err, SaleError::Token(TokenError::InsufficientBalance { .. })));
        assert_eq!(payments.balance_of(BUYER), 1_000);
        assert_eq!(payments.balance_of(TREASURY), 0);
        assert_eq!(auction.table().remaining(0), Some(100));
        assert_eq!(auction.total_sold(), 0);
        assert_eq!(auction.purchases(), 0);
    }

    #[test]
    fn test_expected_return_matches_purchase() {
        let (mut auction, mut token, mut payments) = setup(150);
        let expected = auction.expected_return(130).unwrap();
        assert_eq!(expected, auction.expected_return(130).unwrap());

        let receipt = auction.purchase(&mut token, &mut payments, BUYER, 130).unwrap();
        assert_eq!(receipt.quantity, expected);
    }
}
