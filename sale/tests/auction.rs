// Copyright (c) 2024 Botho Foundation
//
//! Auction behavior over realistic cliff schedules.

use proptest::prelude::*;
use tlc_sale::{Auction, CliffSpec, PriceCliffTable, SaleError, UnitPrice};
use tlc_token::{AccountId, Amount, FeePolicy, Ledger, Token, UNIT};

const TOKEN: AccountId = AccountId::new(1);
const OWNER: AccountId = AccountId::new(2);
const AUCTION: AccountId = AccountId::new(3);
const BUYER: AccountId = AccountId::new(4);
const OTHER: AccountId = AccountId::new(5);

/// 1,000,000 tokens at 18182 per payment unit, then 200,000 at 6250.
fn two_tier_schedule() -> Vec<CliffSpec> {
    vec![
        CliffSpec {
            capacity: 1_000_000 * UNIT,
            price: UnitPrice::tokens_per_payment(18_182 * UNIT).unwrap(),
        },
        CliffSpec {
            capacity: 200_000 * UNIT,
            price: UnitPrice::tokens_per_payment(6_250 * UNIT).unwrap(),
        },
    ]
}

fn deploy() -> (Auction, Token, Ledger) {
    let table = PriceCliffTable::new(two_tier_schedule()).unwrap();
    let policy = FeePolicy::new(OWNER, OWNER, 100 * UNIT);
    let token = Token::new(TOKEN, OWNER, policy, [(AUCTION, 5_000_000 * UNIT)]).unwrap();
    let payments = Ledger::with_genesis([(BUYER, 1_000 * UNIT), (OTHER, 1_000 * UNIT)]).unwrap();
    (Auction::new(table, AUCTION, OWNER), token, payments)
}

// ============================================================================
// Tier boundaries
// ============================================================================

#[test]
fn test_exact_tier_cost_buys_whole_tier() {
    let table = PriceCliffTable::new(vec![
        CliffSpec { capacity: 1_000_000, price: UnitPrice::new(1, 18_182).unwrap() },
        CliffSpec { capacity: 200_000, price: UnitPrice::new(1, 6_250).unwrap() },
    ])
    .unwrap();

    let cost = table.cost_to_exhaust_current().unwrap().unwrap();
    assert_eq!(cost, 55);

    let quote = table.quote(cost).unwrap();
    assert_eq!(quote.quantity, 1_000_000);
    assert_eq!(quote.spent, cost);
    assert_eq!(quote.leftover, 0);
}

#[test]
fn test_purchases_walk_both_tiers() {
    let (mut auction, mut token, mut payments) = deploy();

    let first_tier_cost = auction.table().cost_to_exhaust_current().unwrap().unwrap();
    let receipt = auction
        .purchase(&mut token, &mut payments, BUYER, first_tier_cost)
        .unwrap();
    assert_eq!(receipt.quantity, 1_000_000 * UNIT);
    assert_eq!(receipt.refund, 0);
    assert_eq!(auction.table().cursor(), 1);

    // 32 payment buys the whole second tier at 6250 per unit
    let receipt = auction.purchase(&mut token, &mut payments, OTHER, 32 * UNIT).unwrap();
    assert_eq!(receipt.quantity, 200_000 * UNIT);
    assert_eq!(receipt.refund, 0);
    assert!(auction.table().is_exhausted());

    assert_eq!(
        auction.purchase(&mut token, &mut payments, OTHER, UNIT),
        Err(SaleError::NoInventoryAvailable)
    );
    assert_eq!(token.balance_of(AUCTION), 3_800_000 * UNIT);
    assert_eq!(auction.total_sold(), 1_200_000 * UNIT);
}

#[test]
fn test_marginal_return_drops_in_second_tier() {
    let (auction, _, _) = deploy();
    let cost = auction.table().cost_to_exhaust_current().unwrap().unwrap();

    let in_first = auction.expected_return(UNIT).unwrap();
    let at_boundary = auction.expected_return(cost).unwrap();
    let past_boundary = auction.expected_return(cost + UNIT).unwrap();

    assert_eq!(in_first, 18_182 * UNIT);
    assert_eq!(past_boundary - at_boundary, 6_250 * UNIT);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Property: more payment never buys less.
    #[test]
    fn prop_expected_return_monotonic(a in 0u128..200, b in 0u128..200, sold in 0u128..80) {
        let (mut auction, mut token, mut payments) = deploy();
        if sold > 0 {
            auction.purchase(&mut token, &mut payments, OTHER, sold * UNIT).unwrap();
        }

        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low_return = auction.expected_return(low * UNIT / 3).unwrap();
        let high_return = auction.expected_return(high * UNIT / 3).unwrap();
        prop_assert!(low_return <= high_return);
    }

    /// Property: quoting twice gives the same answer, and a purchase then
    /// delivers exactly the quoted amount.
    #[test]
    fn prop_quote_idempotent_and_honored(payment in 1u128..100_000_000_000_000_000_000) {
        let (mut auction, mut token, mut payments) = deploy();

        let first = auction.quote(payment).unwrap();
        let second = auction.quote(payment).unwrap();
        prop_assert_eq!(&first, &second);

        match auction.purchase(&mut token, &mut payments, BUYER, payment) {
            Ok(receipt) => {
                prop_assert_eq!(receipt.quantity, first.quantity);
                prop_assert_eq!(receipt.refund, first.leftover);
                prop_assert_eq!(token.balance_of(BUYER), first.quantity);
                prop_assert_eq!(payments.balance_of(BUYER), 1_000 * UNIT - first.spent);
            }
            Err(SaleError::PaymentBelowMinimumUnit { .. }) => {
                prop_assert_eq!(first.quantity, 0);
            }
            Err(err) => prop_assert!(false, "unexpected error {err}"),
        }
    }

    /// Property: payment is split exactly into spent and leftover.
    #[test]
    fn prop_quote_accounts_for_every_unit(payment in any::<u64>()) {
        let (auction, _, _) = deploy();
        let quote = auction.quote(payment as Amount).unwrap();
        prop_assert_eq!(quote.spent + quote.leftover, payment as Amount);
        let filled: Amount = quote.fills.iter().map(|fill| fill.quantity).sum();
        prop_assert_eq!(filled, quote.quantity);
    }
}
