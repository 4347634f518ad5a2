// Copyright (c) 2024 Botho Foundation

//! CLI command implementations.
//!
//! These modules implement the user-facing CLI commands and legitimately
//! use stdout for output.

pub mod cliffs;
pub mod init;
pub mod quote;
pub mod simulate;

use anyhow::{Context, Result};
use std::path::Path;
use tlc_sale::UnitPrice;
use tlc_token::{format_units, math::mul_div_floor, Amount, TOKEN_DECIMALS, UNIT};

use crate::config::Config;

fn load_config(config_path: &Path) -> Result<Config> {
    Config::load(config_path).context("No config found. Run 'tlc init' first.")
}

/// Render base units as whole units.
fn units(amount: Amount) -> String {
    format_units(amount, TOKEN_DECIMALS)
}

/// Whole tokens bought by one whole payment unit.
fn tokens_per_payment(price: UnitPrice) -> String {
    match mul_div_floor(UNIT, price.quantity, price.payment) {
        Ok(rate) => units(rate),
        Err(_) => "overflow".to_string(),
    }
}
