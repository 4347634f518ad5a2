// Copyright (c) 2024 Botho Foundation

use anyhow::{Context, Result};
use std::path::Path;

use super::{load_config, units};
use crate::config::parse_amount;
use crate::deploy::Deployment;

/// Preview what an auction payment would buy.
pub fn run(config_path: &Path, payment: &str, after_scenario: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let payment = parse_amount(payment).context("Invalid payment")?;

    let mut deployment = Deployment::from_config(&config)?;
    if after_scenario {
        deployment.run_scenario(&config.scenario);
    }

    let quote = deployment.auction().quote(payment)?;

    println!();
    println!("=== Auction Quote ===");
    println!();
    println!("Payment:  {}", units(quote.payment));
    println!("Tokens:   {}", units(quote.quantity));
    println!("Spent:    {}", units(quote.spent));
    println!("Refund:   {}", units(quote.leftover));
    if !quote.fills.is_empty() {
        println!();
        println!("Fills:");
        for fill in &quote.fills {
            println!(
                "  cliff {}: {} tokens for {}",
                fill.ordinal,
                units(fill.quantity),
                units(fill.cost)
            );
        }
    }
    if quote.quantity == 0 {
        println!();
        if deployment.auction().table().is_exhausted() {
            println!("(Auction is sold out)");
        } else {
            println!("(Payment is below the price of one unit)");
        }
    }
    println!();

    Ok(())
}
