// Copyright (c) 2024 Botho Foundation

use anyhow::Result;
use std::path::Path;

use super::{load_config, tokens_per_payment, units};
use crate::deploy::Deployment;

/// Show the auction's price cliffs.
pub fn run(config_path: &Path, after_scenario: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let mut deployment = Deployment::from_config(&config)?;
    if after_scenario {
        deployment.run_scenario(&config.scenario);
    }

    let table = deployment.auction().table();

    println!();
    println!("=== Price Cliffs ===");
    println!();
    println!(
        "{:>3}  {:>20}  {:>20}  {:>16}",
        "#", "capacity", "remaining", "tokens/payment"
    );
    for (ordinal, cliff) in table.cliffs().iter().enumerate() {
        let marker = if ordinal == table.cursor() { "*" } else { " " };
        println!(
            "{:>2}{}  {:>20}  {:>20}  {:>16}",
            ordinal,
            marker,
            units(cliff.capacity()),
            units(cliff.remaining()),
            tokens_per_payment(cliff.price())
        );
    }
    println!();
    println!("Total remaining: {}", units(table.total_remaining()));
    match table.cost_to_exhaust_current()? {
        Some(cost) => println!("Cost to clear current cliff: {}", units(cost)),
        None => println!("(Auction is sold out)"),
    }
    println!();

    Ok(())
}
