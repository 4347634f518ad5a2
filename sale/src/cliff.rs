// Copyright (c) 2024 Botho Foundation

//! Ordered table of price cliffs.
//!
//! ## Walking the table
//!
//! ```text
//! for each cliff from the cursor with remaining > 0:
//!     taken = min(floor(left × quantity / payment), remaining)
//!     if taken == 0: stop
//!     cost  = ceil(taken × payment / quantity)
//!     left -= cost
//!     if the cliff still has capacity: stop
//! leftover = left
//! ```
//!
//! Prices never decrease by ordinal, so a payment that cannot buy one unit
//! of the current cliff cannot buy one of any later cliff either. The cursor
//! only moves forward, past cliffs whose capacity reached zero.

use tlc_token::Amount;
use tracing::debug;

use crate::{error::SaleError, price::UnitPrice};

/// One configured tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CliffSpec {
    pub capacity: Amount,
    pub price: UnitPrice,
}

/// A tier together with its unsold capacity.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceCliff {
    capacity: Amount,
    remaining: Amount,
    price: UnitPrice,
}

impl PriceCliff {
    pub fn capacity(&self) -> Amount {
        self.capacity
    }

    pub fn remaining(&self) -> Amount {
        self.remaining
    }

    pub fn sold(&self) -> Amount {
        self.capacity - self.remaining
    }

    pub fn price(&self) -> UnitPrice {
        self.price
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Units taken from a single cliff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fill {
    pub ordinal: usize,
    pub quantity: Amount,
    pub cost: Amount,
}

/// Result of walking the table with a payment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quote {
    pub payment: Amount,
    /// Total inventory units.
    pub quantity: Amount,
    /// Payment consumed by the fills.
    pub spent: Amount,
    /// Payment that bought nothing. `spent + leftover == payment`.
    pub leftover: Amount,
    pub fills: Vec<Fill>,
}

/// Price cliffs in activation order plus a monotonic cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceCliffTable {
    cliffs: Vec<PriceCliff>,
    cursor: usize,
}

impl PriceCliffTable {
    /// Build a table, validating the schedule.
    ///
    /// Zero-capacity cliffs are accepted and never sold from. The total
    /// capacity must fit in an [`Amount`].
    pub fn new(schedule: Vec<CliffSpec>) -> Result<Self, SaleError> {
        if schedule.is_empty() {
            return Err(SaleError::InvalidCliffSchedule("no cliffs".to_string()));
        }
        if schedule
            .iter()
            .try_fold(0, |total: Amount, spec| total.checked_add(spec.capacity))
            .is_none()
        {
            return Err(SaleError::InvalidCliffSchedule(
                "total capacity overflows".to_string(),
            ));
        }

        for (ordinal, spec) in schedule.iter().enumerate() {
            if spec.price.payment == 0 || spec.price.quantity == 0 {
                return Err(SaleError::InvalidCliffSchedule(format!(
                    "cliff {ordinal} has price {}",
                    spec.price
                )));
            }
        }
        for (ordinal, pair) in schedule.windows(2).enumerate() {
            if pair[1].price.cmp_cost(&pair[0].price).is_lt() {
                return Err(SaleError::InvalidCliffSchedule(format!(
                    "cliff {} price {} is below cliff {ordinal} price {}",
                    ordinal + 1,
                    pair[1].price,
                    pair[0].price
                )));
            }
        }

        let cliffs = schedule
            .into_iter()
            .map(|spec| PriceCliff {
                capacity: spec.capacity,
                remaining: spec.capacity,
                price: spec.price,
            })
            .collect();

        let mut table = Self { cliffs, cursor: 0 };
        table.advance_cursor();
        Ok(table)
    }

    /// Quote `payment` against the current state without mutating it.
    pub fn quote(&self, payment: Amount) -> Result<Quote, SaleError> {
        let mut quote = Quote {
            payment,
            ..Quote::default()
        };
        let mut left = payment;

        for (ordinal, cliff) in self.cliffs.iter().enumerate().skip(self.cursor) {
            if left == 0 {
                break;
            }
            if cliff.is_exhausted() {
                continue;
            }

            let taken = cliff.price.affordable(left, cliff.remaining);
            if taken == 0 {
                break;
            }
            let cost = cliff.price.cost(taken)?;

            quote.fills.push(Fill {
                ordinal,
                quantity: taken,
                cost,
            });
            quote.quantity = quote
                .quantity
                .checked_add(taken)
                .ok_or(SaleError::ArithmeticOverflow)?;
            left -= cost;

            if taken < cliff.remaining {
                break;
            }
        }

        quote.spent = payment - left;
        quote.leftover = left;

        debug!(
            payment,
            quantity = quote.quantity,
            leftover = quote.leftover,
            cliffs = quote.fills.len(),
            "cliff quote"
        );
        Ok(quote)
    }

    /// Quote `payment` and take the quoted units out of the table.
    pub fn consume(&mut self, payment: Amount) -> Result<Quote, SaleError> {
        let quote = self.quote(payment)?;
        self.commit(&quote);
        Ok(quote)
    }

    /// Apply the fills of a quote taken against the current state.
    pub(crate) fn commit(&mut self, quote: &Quote) {
        for fill in &quote.fills {
            if let Some(cliff) = self.cliffs.get_mut(fill.ordinal) {
                cliff.remaining = cliff.remaining.saturating_sub(fill.quantity);
            }
        }
        self.advance_cursor();
    }

    fn advance_cursor(&mut self) {
        while self
            .cliffs
            .get(self.cursor)
            .is_some_and(PriceCliff::is_exhausted)
        {
            self.cursor += 1;
        }
    }

    /// All cliffs in ordinal order.
    pub fn cliffs(&self) -> &[PriceCliff] {
        &self.cliffs
    }

    /// Ordinal of the cliff currently selling. Equals the number of cliffs
    /// once the table is exhausted.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The cliff currently selling.
    pub fn current(&self) -> Option<&PriceCliff> {
        self.cliffs.get(self.cursor)
    }

    /// Unsold capacity of one cliff.
    pub fn remaining(&self, ordinal: usize) -> Option<Amount> {
        self.cliffs.get(ordinal).map(PriceCliff::remaining)
    }

    pub fn total_remaining(&self) -> Amount {
        self.cliffs.iter().map(PriceCliff::remaining).sum()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.cliffs.len()
    }

    /// Payment that buys out the current cliff exactly, if any is left.
    pub fn cost_to_exhaust_current(&self) -> Result<Option<Amount>, SaleError> {
        self.current()
            .map(|cliff| cliff.price.cost(cliff.remaining))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(capacity: Amount, payment: Amount, quantity: Amount) -> CliffSpec {
        CliffSpec {
            capacity,
            price: UnitPrice::new(payment, quantity).unwrap(),
        }
    }

    /// Two cliffs: 100 units at 1 each, then 50 units at 2 each.
    fn simple() -> PriceCliffTable {
        PriceCliffTable::new(vec![spec(100, 1, 1), spec(50, 2, 1)]).unwrap()
    }

    #[test]
    fn test_rejects_bad_schedule() {
        assert!(matches!(
            PriceCliffTable::new(vec![]),
            Err(SaleError::InvalidCliffSchedule(_))
        ));
        assert!(matches!(
            PriceCliffTable::new(vec![spec(10, 2, 1), spec(10, 1, 1)]),
            Err(SaleError::InvalidCliffSchedule(_))
        ));

        let zero_price = CliffSpec {
            capacity: 10,
            price: UnitPrice { payment: 0, quantity: 1 },
        };
        assert!(PriceCliffTable::new(vec![zero_price]).is_err());

        // equal prices are fine
        assert!(PriceCliffTable::new(vec![spec(10, 1, 1), spec(10, 2, 2)]).is_ok());
    }

    #[test]
    fn test_capacity_overflow_rejected() {
        assert_eq!(
            PriceCliffTable::new(vec![spec(Amount::MAX, 1, 2), spec(10, 1, 2)]),
            Err(SaleError::InvalidCliffSchedule(
                "total capacity overflows".to_string()
            ))
        );

        let table = PriceCliffTable::new(vec![spec(Amount::MAX, 1, 2), spec(0, 1, 2)]).unwrap();
        let quote = table.quote(Amount::MAX).unwrap();
        assert_eq!(quote.quantity, Amount::MAX);
        assert_eq!(table.total_remaining(), Amount::MAX);
    }

    #[test]
    fn test_quote_within_one_cliff() {
        let table = simple();
        let quote = table.quote(40).unwrap();

        assert_eq!(quote.quantity, 40);
        assert_eq!(quote.spent, 40);
        assert_eq!(quote.leftover, 0);
        assert_eq!(quote.fills, vec![Fill { ordinal: 0, quantity: 40, cost: 40 }]);
    }

    #[test]
    fn test_quote_spans_cliffs() {
        let table = simple();
        let quote = table.quote(121).unwrap();

        // 100 at 1, then 10 at 2, 1 left over
        assert_eq!(quote.quantity, 110);
        assert_eq!(quote.spent, 120);
        assert_eq!(quote.leftover, 1);
        assert_eq!(quote.fills.len(), 2);
    }

    #[test]
    fn test_exhausted_table_reports_surplus() {
        let mut table = simple();
        let quote = table.consume(1_000).unwrap();

        assert_eq!(quote.quantity, 150);
        assert_eq!(quote.spent, 200);
        assert_eq!(quote.leftover, 800);
        assert!(table.is_exhausted());
        assert_eq!(table.cursor(), 2);
        assert_eq!(table.total_remaining(), 0);

        let after = table.quote(10).unwrap();
        assert_eq!(after.quantity, 0);
        assert_eq!(after.leftover, 10);
        assert_eq!(table.cost_to_exhaust_current().unwrap(), None);
    }

    #[test]
    fn test_zero_capacity_cliffs_skipped() {
        let mut table =
            PriceCliffTable::new(vec![spec(0, 1, 1), spec(5, 1, 1), spec(0, 2, 1), spec(5, 3, 1)])
                .unwrap();
        assert_eq!(table.cursor(), 1);

        let quote = table.consume(8).unwrap();
        assert_eq!(quote.quantity, 6);
        assert_eq!(quote.fills[1].ordinal, 3);
        assert_eq!(quote.leftover, 0);
        assert_eq!(table.cursor(), 3);
    }

    #[test]
    fn test_consume_moves_cursor_forward_only() {
        let mut table = simple();
        table.consume(100).unwrap();
        assert_eq!(table.cursor(), 1);
        assert_eq!(table.remaining(0), Some(0));

        let quote = table.consume(3).unwrap();
        assert_eq!(quote.quantity, 1);
        assert_eq!(quote.leftover, 1);
        assert_eq!(table.remaining(1), Some(49));
        assert_eq!(table.cursor(), 1);
    }

    #[test]
    fn test_payment_below_one_unit_buys_nothing() {
        let table = PriceCliffTable::new(vec![spec(100, 10, 1)]).unwrap();
        let quote = table.quote(9).unwrap();
        assert_eq!(quote.quantity, 0);
        assert!(quote.fills.is_empty());
        assert_eq!(quote.leftover, 9);
    }

    #[test]
    fn test_partial_cliff_stops_walk() {
        // 7 units of payment at 2/3 per unit: the cliff is not exhausted, so
        // the next cliff is not touched even though payment remains
        let table = PriceCliffTable::new(vec![spec(100, 3, 2), spec(100, 3, 1)]).unwrap();
        let quote = table.quote(7).unwrap();
        assert_eq!(quote.quantity, 4);
        assert_eq!(quote.spent, 6);
        assert_eq!(quote.leftover, 1);
        assert_eq!(quote.fills.len(), 1);
    }

    #[test]
    fn test_cost_to_exhaust_current() {
        let mut table = simple();
        assert_eq!(table.cost_to_exhaust_current().unwrap(), Some(100));
        table.consume(60).unwrap();
        assert_eq!(table.cost_to_exhaust_current().unwrap(), Some(40));
    }
}
