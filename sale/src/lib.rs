// Copyright (c) 2024 Botho Foundation

//! Inventory sales for the TLC token.
//!
//! Two sale mechanisms draw on the same settlement path:
//!
//! - [`Auction`]: walks a [`PriceCliffTable`] of fixed-capacity, fixed-price
//!   tiers. A single payment may span several tiers and the price only rises
//!   as capacity is consumed.
//! - [`FixedPriceSale`]: one price for every unit, optionally restricted to a
//!   whitelist.
//!
//! Payments are held in a separate [`Ledger`](tlc_token::Ledger) of the
//! payment asset. A purchase either moves the spent payment to the treasury
//! and the inventory to the buyer, or changes nothing. Unspent payment never
//! leaves the buyer.

mod auction;
mod cliff;
mod error;
mod presale;
mod price;
mod settle;

pub use auction::{Auction, PurchaseReceipt};
pub use cliff::{CliffSpec, Fill, PriceCliff, PriceCliffTable, Quote};
pub use error::SaleError;
pub use presale::FixedPriceSale;
pub use price::UnitPrice;
