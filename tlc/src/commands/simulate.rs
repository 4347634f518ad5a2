// Copyright (c) 2024 Botho Foundation

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;

use super::{load_config, units};
use crate::deploy::{Deployment, Report, StepOutcome, StepRecord};

#[derive(Serialize)]
struct Simulation {
    steps: Vec<StepRecord>,
    report: Report,
}

/// Deploy and replay the configured scenario.
pub fn run(config_path: &Path, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let mut deployment = Deployment::from_config(&config)?;
    let steps = deployment.run_scenario(&config.scenario);
    let report = deployment.report();
    let holds = report.conservation.holds;

    if json {
        let simulation = Simulation { steps, report };
        let rendered =
            serde_json::to_string_pretty(&simulation).context("Failed to serialize report")?;
        println!("{rendered}");
    } else {
        print_steps(&steps);
        print_report(&report);
    }

    if !holds {
        bail!("Conservation check failed");
    }
    Ok(())
}

fn print_steps(steps: &[StepRecord]) {
    println!();
    println!("=== Scenario ===");
    println!();
    for record in steps {
        let summary = match (&record.outcome, &record.error) {
            (Some(StepOutcome::Purchase(receipt)), _) => format!(
                "bought {} tokens for {} (refund {})",
                units(receipt.quantity),
                units(receipt.spent),
                units(receipt.refund)
            ),
            (Some(StepOutcome::Swap(swap)), _) => {
                let mut line = format!(
                    "swapped {} for {} (fee {})",
                    units(swap.amount_in),
                    units(swap.amount_out),
                    units(swap.transfer.fee)
                );
                if swap.transfer.liquidation.is_some() {
                    line.push_str(", fee reserve liquidated");
                }
                line
            }
            (Some(StepOutcome::Transfer(transfer)), _) => format!(
                "delivered {} (fee {})",
                units(transfer.delivered),
                units(transfer.fee)
            ),
            (Some(StepOutcome::Whitelisted { account }), _) => format!("whitelisted {account}"),
            (Some(StepOutcome::FeeRateSet { rate_bps }), _) => format!("fee rate now {rate_bps} bps"),
            (None, Some(error)) => format!("FAILED: {error}"),
            (None, None) => "skipped".to_string(),
        };
        println!("  {:>2}. {:?}", record.index + 1, record.step);
        println!("      {summary}");
    }
}

fn print_report(report: &Report) {
    println!();
    println!("=== Balances ===");
    println!();
    println!(
        "  {:<12} {:>24} {:>16} {:>16}",
        "account", "tokens", "natives", "fee payouts"
    );
    for account in &report.accounts {
        println!(
            "  {:<12} {:>24} {:>16} {:>16}",
            account.name,
            units(account.tokens),
            units(account.natives),
            units(account.payouts)
        );
    }

    println!();
    println!("Fee engine:");
    println!("  Reserve: {}", units(report.fee_reserve));
    println!("  Withheld: {}", units(report.fee_stats.total_withheld));
    println!(
        "  Liquidations: {} ({} failed)",
        report.fee_stats.liquidations, report.fee_stats.failed_liquidations
    );
    println!("  Proceeds: {}", units(report.fee_stats.total_proceeds));

    println!();
    println!("Pool:");
    println!("  Token reserve: {}", units(report.pool.token_reserve()));
    println!("  Native reserve: {}", units(report.pool.native_reserve()));

    println!();
    println!("Auction:");
    println!("  Sold: {}", units(report.auction.total_sold));
    println!("  Raised: {}", units(report.auction.total_raised));
    println!("  Current cliff: {}", report.auction.cursor);

    if let Some(ref presale) = report.presale {
        println!();
        println!("Presale:");
        println!("  Sold: {}", units(presale.total_sold));
        println!("  Raised: {}", units(presale.total_raised));
    }

    println!();
    println!(
        "Conservation: {}",
        if report.conservation.holds { "ok" } else { "VIOLATED" }
    );
    println!();
}
