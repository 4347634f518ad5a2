// Copyright (c) 2024 Botho Foundation

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tlc::{commands, config};

#[derive(Parser)]
#[command(name = "tlc")]
#[command(about = "Simulate a TLC token launch: fee-on-sell token, presale and cliff auction", long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.tlc/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default launch configuration
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Preview what an auction payment buys
    Quote {
        /// Payment in whole units (e.g. 55 or 0.5)
        payment: String,

        /// Quote against the state after replaying the scenario
        #[arg(long)]
        after_scenario: bool,
    },

    /// Show the auction's price cliffs
    Cliffs {
        /// Show the state after replaying the scenario
        #[arg(long)]
        after_scenario: bool,
    },

    /// Deploy and replay the configured scenario
    Simulate {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize simple logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = match cli.config {
        Some(path) => PathBuf::from(path),
        None => config::default_config_path()?,
    };

    match cli.command {
        Commands::Init { force } => commands::init::run(&config_path, force),
        Commands::Quote {
            payment,
            after_scenario,
        } => commands::quote::run(&config_path, &payment, after_scenario),
        Commands::Cliffs { after_scenario } => commands::cliffs::run(&config_path, after_scenario),
        Commands::Simulate { json } => commands::simulate::run(&config_path, json),
    }
}
