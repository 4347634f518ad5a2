// Copyright (c) 2024 Botho Foundation

//! In-memory launch: deploy, fund the sales, seed the pool, replay steps.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tlc_sale::{Auction, FixedPriceSale, PriceCliffTable, PurchaseReceipt, UnitPrice};
use tlc_token::{AccountId, Amount, FeePolicy, FeeStats, Ledger, Token, TransferResult};
use tracing::{info, warn};

use crate::config::{parse_amount, Config, Step};
use crate::pool::{ConstantProductPool, SharedPool, SwapReceipt};

pub const TOKEN_ACCOUNT: AccountId = AccountId::new(1);
pub const PRESALE_ACCOUNT: AccountId = AccountId::new(2);
pub const AUCTION_ACCOUNT: AccountId = AccountId::new(3);
pub const POOL_ACCOUNT: AccountId = AccountId::new(4);

/// First id handed out to a named account.
const FIRST_USER_ACCOUNT: u64 = 100;

/// Name to account id mapping. Contract accounts have fixed ids; every other
/// name gets the next free id on first use.
#[derive(Clone, Debug)]
pub struct AccountBook {
    by_name: BTreeMap<String, AccountId>,
    next: u64,
}

impl Default for AccountBook {
    fn default() -> Self {
        let by_name = [
            ("token", TOKEN_ACCOUNT),
            ("presale", PRESALE_ACCOUNT),
            ("auction", AUCTION_ACCOUNT),
            ("pool", POOL_ACCOUNT),
        ]
        .into_iter()
        .map(|(name, id)| (name.to_string(), id))
        .collect();

        Self {
            by_name,
            next: FIRST_USER_ACCOUNT,
        }
    }
}

impl AccountBook {
    /// Id for `name`, allocating one if the name is new.
    pub fn resolve(&mut self, name: &str) -> AccountId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = AccountId::new(self.next);
        self.next += 1;
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn get(&self, name: &str) -> Option<AccountId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: AccountId) -> Option<&str> {
        self.by_name
            .iter()
            .find(|(_, account)| **account == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, AccountId)> + '_ {
        self.by_name.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

/// What a successful step produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutcome {
    Purchase(PurchaseReceipt),
    Swap(SwapReceipt),
    Transfer(TransferResult),
    Whitelisted { account: AccountId },
    FeeRateSet { rate_bps: u32 },
}

/// One replayed step and how it ended.
#[derive(Clone, Debug, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub step: Step,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<StepOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Every ledger and contract of a launch.
pub struct Deployment {
    book: AccountBook,
    owner: AccountId,
    token: Token,
    natives: Ledger,
    presale: Option<FixedPriceSale>,
    auction: Auction,
    pool: SharedPool,
    initial_natives: Amount,
}

impl Deployment {
    /// Run the launch sequence described by `config`.
    ///
    /// Liquidity is seeded before the pool becomes the fee trigger, so the
    /// deposit itself is not taxed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut book = AccountBook::default();
        let owner = book.resolve(&config.token.owner);
        let dev = book.resolve(&config.token.dev);
        let marketing = book.resolve(&config.token.marketing);

        let supply = parse_amount(&config.token.genesis_supply).context("token.genesis_supply")?;
        let threshold = parse_amount(&config.token.liquidation_threshold)
            .context("token.liquidation_threshold")?;
        let policy = FeePolicy::new(dev, marketing, threshold)
            .with_beneficiary_b_share(config.token.marketing_share_bps);

        let pool = SharedPool::new(ConstantProductPool::new(POOL_ACCOUNT, config.pool.swap_fee_bps)?);
        let mut token = Token::new(TOKEN_ACCOUNT, owner, policy, [(owner, supply)])
            .context("Failed to deploy token")?
            .with_exchange(Box::new(pool.clone()));

        let mut allocations = Vec::with_capacity(config.natives.len());
        for (name, amount) in &config.natives {
            let amount = parse_amount(amount).with_context(|| format!("natives.{name}"))?;
            allocations.push((book.resolve(name), amount));
        }
        let mut natives = Ledger::with_genesis(allocations)?;
        let initial_natives = natives.total_supply();

        let presale = match &config.presale {
            Some(presale) => {
                let price = UnitPrice::per_token(parse_amount(&presale.price).context("presale.price")?)?;
                let mut sale = FixedPriceSale::new(owner, price, PRESALE_ACCOUNT, owner)?;
                sale.set_whitelist_enabled(owner, presale.whitelist_enabled)?;
                for name in &presale.whitelist {
                    sale.add_to_whitelist(owner, book.resolve(name))?;
                }

                let allocation = parse_amount(&presale.allocation).context("presale.allocation")?;
                token
                    .apply_transfer(owner, PRESALE_ACCOUNT, allocation)
                    .context("Failed to fund presale")?;
                Some(sale)
            }
            None => None,
        };

        let table = PriceCliffTable::new(config.cliff_schedule()?)?;
        let allocation = parse_amount(&config.auction.allocation).context("auction.allocation")?;
        token
            .apply_transfer(owner, AUCTION_ACCOUNT, allocation)
            .context("Failed to fund auction")?;
        let auction = Auction::new(table, AUCTION_ACCOUNT, owner);

        let provider = match &config.pool.provider {
            Some(name) => book.resolve(name),
            None => owner,
        };
        let token_liquidity = parse_amount(&config.pool.token_liquidity).context("pool.token_liquidity")?;
        let native_liquidity =
            parse_amount(&config.pool.native_liquidity).context("pool.native_liquidity")?;
        pool.add_liquidity(&mut token, &mut natives, provider, token_liquidity, native_liquidity)
            .context("Failed to seed pool liquidity")?;

        token.set_fee_trigger(owner, Some(POOL_ACCOUNT), config.token.fee_rate_bps)?;

        info!(
            supply,
            pool_tokens = token_liquidity,
            pool_natives = native_liquidity,
            "deployment complete"
        );

        Ok(Self {
            book,
            owner,
            token,
            natives,
            presale,
            auction,
            pool,
            initial_natives,
        })
    }

    /// Apply one scenario step.
    pub fn run_step(&mut self, step: &Step) -> Result<StepOutcome> {
        let outcome = match step {
            Step::Presale { buyer, payment } => {
                let buyer = self.book.resolve(buyer);
                let payment = parse_amount(payment)?;
                let sale = self
                    .presale
                    .as_mut()
                    .ok_or_else(|| anyhow!("no presale configured"))?;
                StepOutcome::Purchase(sale.purchase(&mut self.token, &mut self.natives, buyer, payment)?)
            }
            Step::Auction { buyer, payment } => {
                let buyer = self.book.resolve(buyer);
                let payment = parse_amount(payment)?;
                StepOutcome::Purchase(self.auction.purchase(
                    &mut self.token,
                    &mut self.natives,
                    buyer,
                    payment,
                )?)
            }
            Step::Buy { buyer, payment } => {
                let buyer = self.book.resolve(buyer);
                let payment = parse_amount(payment)?;
                StepOutcome::Swap(self.pool.buy(&mut self.token, &mut self.natives, buyer, payment)?)
            }
            Step::Sell { seller, amount } => {
                let seller = self.book.resolve(seller);
                let amount = parse_amount(amount)?;
                StepOutcome::Swap(self.pool.sell(&mut self.token, &mut self.natives, seller, amount)?)
            }
            Step::Transfer { from, to, amount } => {
                let from = self.book.resolve(from);
                let to = self.book.resolve(to);
                let amount = parse_amount(amount)?;
                StepOutcome::Transfer(self.token.apply_transfer(from, to, amount)?)
            }
            Step::Whitelist { account } => {
                let account = self.book.resolve(account);
                let sale = self
                    .presale
                    .as_mut()
                    .ok_or_else(|| anyhow!("no presale configured"))?;
                sale.add_to_whitelist(self.owner, account)?;
                StepOutcome::Whitelisted { account }
            }
            Step::SetFeeRate { rate_bps } => {
                self.token
                    .set_fee_trigger(self.owner, Some(POOL_ACCOUNT), *rate_bps)?;
                StepOutcome::FeeRateSet { rate_bps: *rate_bps }
            }
        };
        Ok(outcome)
    }

    /// Replay `steps` in order. A failed step is recorded and the rest still
    /// run, since every operation leaves state unchanged on failure.
    pub fn run_scenario(&mut self, steps: &[Step]) -> Vec<StepRecord> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| match self.run_step(step) {
                Ok(outcome) => StepRecord {
                    index,
                    step: step.clone(),
                    outcome: Some(outcome),
                    error: None,
                },
                Err(err) => {
                    warn!(index, error = %format!("{err:#}"), "scenario step failed");
                    StepRecord {
                        index,
                        step: step.clone(),
                        outcome: None,
                        error: Some(format!("{err:#}")),
                    }
                }
            })
            .collect()
    }

    /// Balances, fee statistics and conservation checks.
    pub fn report(&self) -> Report {
        let accounts = self
            .book
            .iter()
            .map(|(name, id)| AccountReport {
                name: name.to_string(),
                account: id,
                tokens: self.token.balance_of(id),
                natives: self.natives.balance_of(id),
                payouts: self.token.reserve_asset_balance(id),
            })
            .collect();

        let pool = self.pool.snapshot();
        let payouts = self.token.stats().total_proceeds;
        let native_accounted = self
            .natives
            .total_supply()
            .saturating_add(pool.native_reserve())
            .saturating_add(payouts);
        let token_balances = self.token.ledger().sum_of_balances();

        Report {
            accounts,
            fee_reserve: self.token.reserve_balance(),
            fee_stats: self.token.stats().clone(),
            pool,
            auction: AuctionReport {
                total_sold: self.auction.total_sold(),
                total_raised: self.auction.total_raised(),
                cursor: self.auction.table().cursor(),
                remaining: self
                    .auction
                    .table()
                    .cliffs()
                    .iter()
                    .map(|cliff| cliff.remaining())
                    .collect(),
            },
            presale: self.presale.as_ref().map(|sale| PresaleReport {
                total_sold: sale.total_sold(),
                total_raised: sale.total_raised(),
            }),
            conservation: Conservation {
                token_supply: self.token.total_supply(),
                token_balances,
                native_initial: self.initial_natives,
                native_accounted,
                holds: token_balances == Some(self.token.total_supply())
                    && native_accounted == self.initial_natives,
            },
        }
    }

    pub fn book(&self) -> &AccountBook {
        &self.book
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn natives(&self) -> &Ledger {
        &self.natives
    }

    pub fn auction(&self) -> &Auction {
        &self.auction
    }

    pub fn presale(&self) -> Option<&FixedPriceSale> {
        self.presale.as_ref()
    }

    pub fn pool(&self) -> ConstantProductPool {
        self.pool.snapshot()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AccountReport {
    pub name: String,
    pub account: AccountId,
    pub tokens: Amount,
    pub natives: Amount,
    /// Payment asset received from fee conversions.
    pub payouts: Amount,
}

#[derive(Clone, Debug, Serialize)]
pub struct AuctionReport {
    pub total_sold: Amount,
    pub total_raised: Amount,
    pub cursor: usize,
    pub remaining: Vec<Amount>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PresaleReport {
    pub total_sold: Amount,
    pub total_raised: Amount,
}

/// Token supply equals the sum of balances, and every unit of the payment
/// asset is either in the native ledger, the pool, or paid out.
#[derive(Clone, Debug, Serialize)]
pub struct Conservation {
    pub token_supply: Amount,
    pub token_balances: Option<Amount>,
    pub native_initial: Amount,
    pub native_accounted: Amount,
    pub holds: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub accounts: Vec<AccountReport>,
    pub fee_reserve: Amount,
    pub fee_stats: FeeStats,
    pub pool: ConstantProductPool,
    pub auction: AuctionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presale: Option<PresaleReport>,
    pub conservation: Conservation,
}
