// Copyright (c) 2024 Botho Foundation

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tlc_sale::{CliffSpec, UnitPrice};
use tlc_token::{parse_units, Amount, TOKEN_DECIMALS};

/// Launch configuration. Amounts are decimal strings in whole tokens (or
/// whole payment units), e.g. `"10_000_000"` or `"0.001"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub token: TokenConfig,

    /// Fixed-price sale; omit to skip it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presale: Option<PresaleConfig>,

    pub auction: AuctionConfig,

    #[serde(default)]
    pub pool: PoolConfig,

    /// Starting payment-asset balances by account name.
    #[serde(default)]
    pub natives: BTreeMap<String, String>,

    /// Steps replayed by `tlc simulate`.
    #[serde(default)]
    pub scenario: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Receives the genesis supply and administers the token.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Beneficiary A (development). Receives the rounding remainder.
    #[serde(default = "default_dev")]
    pub dev: String,

    /// Beneficiary B (marketing).
    #[serde(default = "default_marketing")]
    pub marketing: String,

    #[serde(default = "default_genesis_supply")]
    pub genesis_supply: String,

    /// Fee on sells into the pool, bound once liquidity exists.
    #[serde(default = "default_fee_rate_bps")]
    pub fee_rate_bps: u32,

    /// Reserve size that triggers conversion.
    #[serde(default = "default_liquidation_threshold")]
    pub liquidation_threshold: String,

    /// Marketing share of conversion proceeds.
    #[serde(default = "default_marketing_share_bps")]
    pub marketing_share_bps: u32,
}

fn default_owner() -> String {
    "owner".to_string()
}

fn default_dev() -> String {
    "dev".to_string()
}

fn default_marketing() -> String {
    "marketing".to_string()
}

fn default_genesis_supply() -> String {
    "1_000_000_000".to_string()
}

fn default_fee_rate_bps() -> u32 {
    400
}

fn default_liquidation_threshold() -> String {
    "100".to_string()
}

fn default_marketing_share_bps() -> u32 {
    5_000
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            dev: default_dev(),
            marketing: default_marketing(),
            genesis_supply: default_genesis_supply(),
            fee_rate_bps: default_fee_rate_bps(),
            liquidation_threshold: default_liquidation_threshold(),
            marketing_share_bps: default_marketing_share_bps(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresaleConfig {
    /// Payment per whole token.
    pub price: String,

    /// Tokens moved from the owner into the sale.
    pub allocation: String,

    #[serde(default)]
    pub whitelist_enabled: bool,

    #[serde(default)]
    pub whitelist: Vec<String>,
}

impl Default for PresaleConfig {
    fn default() -> Self {
        Self {
            price: "0.001".to_string(),
            allocation: "10_000_000".to_string(),
            whitelist_enabled: false,
            whitelist: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionConfig {
    /// Tokens moved from the owner into the auction.
    pub allocation: String,

    /// Price cliffs in activation order.
    pub cliffs: Vec<CliffConfig>,
}

/// One price cliff. Give exactly one of `price` or `tokens_per_payment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliffConfig {
    pub capacity: String,

    /// Payment per whole token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    /// Whole tokens per whole payment unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_per_payment: Option<String>,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            allocation: "5_000_000".to_string(),
            cliffs: vec![
                CliffConfig {
                    capacity: "1_000_000".to_string(),
                    price: None,
                    tokens_per_payment: Some("18182".to_string()),
                },
                CliffConfig {
                    capacity: "200_000".to_string(),
                    price: None,
                    tokens_per_payment: Some("6250".to_string()),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Liquidity provider; defaults to the token owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default = "default_token_liquidity")]
    pub token_liquidity: String,

    #[serde(default = "default_native_liquidity")]
    pub native_liquidity: String,

    /// Swap fee kept by the pool.
    #[serde(default = "default_swap_fee_bps")]
    pub swap_fee_bps: u32,
}

fn default_token_liquidity() -> String {
    "10_000_000".to_string()
}

fn default_native_liquidity() -> String {
    "10_000".to_string()
}

fn default_swap_fee_bps() -> u32 {
    25
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            provider: None,
            token_liquidity: default_token_liquidity(),
            native_liquidity: default_native_liquidity(),
            swap_fee_bps: default_swap_fee_bps(),
        }
    }
}

/// One scenario step. Accounts are referred to by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Buy from the fixed-price sale.
    Presale { buyer: String, payment: String },

    /// Buy from the cliff auction.
    Auction { buyer: String, payment: String },

    /// Buy tokens from the pool with the payment asset.
    Buy { buyer: String, payment: String },

    /// Sell tokens into the pool.
    Sell { seller: String, amount: String },

    /// Wallet-to-wallet token transfer.
    Transfer { from: String, to: String, amount: String },

    /// Owner adds an account to the presale whitelist.
    Whitelist { account: String },

    /// Owner rebinds the sell fee rate (the trigger stays on the pool).
    SetFeeRate { rate_bps: u32 },
}

impl Default for Config {
    /// The reference launch: presale, three sells, then two auction buys.
    fn default() -> Self {
        let natives = [
            ("owner", "20_000"),
            ("user1", "10"),
            ("user2", "100"),
            ("user3", "100"),
        ]
        .into_iter()
        .map(|(name, amount)| (name.to_string(), amount.to_string()))
        .collect();

        let sell = |amount: &str| Step::Sell {
            seller: "user1".to_string(),
            amount: amount.to_string(),
        };

        Self {
            token: TokenConfig::default(),
            presale: Some(PresaleConfig::default()),
            auction: AuctionConfig::default(),
            pool: PoolConfig::default(),
            natives,
            scenario: vec![
                Step::Presale {
                    buyer: "user1".to_string(),
                    payment: "5".to_string(),
                },
                sell("1000"),
                sell("1500"),
                sell("500"),
                Step::Auction {
                    buyer: "user2".to_string(),
                    payment: "55".to_string(),
                },
                Step::Auction {
                    buyer: "user3".to_string(),
                    payment: "32".to_string(),
                },
            ],
        }
    }
}

impl Config {
    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Check if config file exists
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Parsed cliff schedule.
    pub fn cliff_schedule(&self) -> Result<Vec<CliffSpec>> {
        self.auction
            .cliffs
            .iter()
            .enumerate()
            .map(|(ordinal, cliff)| {
                cliff
                    .to_spec()
                    .with_context(|| format!("Invalid auction cliff {ordinal}"))
            })
            .collect()
    }
}

impl CliffConfig {
    pub fn to_spec(&self) -> Result<CliffSpec> {
        let capacity = parse_amount(&self.capacity).context("capacity")?;
        let price = match (&self.price, &self.tokens_per_payment) {
            (Some(price), None) => UnitPrice::per_token(parse_amount(price).context("price")?)?,
            (None, Some(rate)) => {
                UnitPrice::tokens_per_payment(parse_amount(rate).context("tokens_per_payment")?)?
            }
            _ => bail!("set exactly one of price or tokens_per_payment"),
        };
        Ok(CliffSpec { capacity, price })
    }
}

/// Parse a whole-unit decimal string into base units.
pub fn parse_amount(input: &str) -> Result<Amount> {
    parse_units(input, TOKEN_DECIMALS).map_err(|e| anyhow!("invalid amount {input:?}: {e}"))
}

/// Get the default config directory path
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".tlc"))
        .context("Could not determine home directory")
}

/// Get the default config file path
pub fn default_config_path() -> Result<PathBuf> {
    Ok(default_data_dir()?.join("config.toml"))
}
