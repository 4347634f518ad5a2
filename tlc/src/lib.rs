// Copyright (c) 2024 Botho Foundation

//! Deployment simulator for the TLC token.
//!
//! Reproduces a full launch in memory: genesis mint, funding the presale and
//! the cliff auction, seeding a constant-product pool, binding the sell fee
//! to the pool, then replaying a scenario of buys, sells and transfers from
//! the config file.

#![deny(clippy::print_stdout)]

pub mod config;
pub mod deploy;
pub mod pool;

// CLI command implementations
#[allow(clippy::print_stdout)]
pub mod commands;
