//! Single-pass replay of a ledger into balances, weekly valuations and
//! invested/earned/donated accumulators.
//!
//! The fold is strictly sequential: every transaction re-values the whole
//! portfolio with the balances left by the transactions before it.

use crate::core::aggregate::UNPRICED;
use crate::core::calendar::{FiscalYear, WeekBucket, fiscal_year, week_start};
use crate::core::error::{Error, Result};
use crate::core::ledger::{Ledger, Transaction};
use crate::core::oracle::PriceOracle;
use crate::core::ordered::OrderedMap;
use crate::core::price::AssetId;
use crate::core::resolver::SymbolResolver;
use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

/// Money flows valued at the weekly mean price of the transaction's week.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Flows {
    /// Signed: buys add, sells subtract.
    pub invested: f64,
    pub earned: f64,
    pub donated: f64,
}

impl Flows {
    fn add(&mut self, flow: Flow) {
        match flow {
            Flow::Invested(v) => self.invested += v,
            Flow::Earned(v) => self.earned += v,
            Flow::Donated(v) => self.donated += v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Invested(f64),
    Earned(f64),
    Donated(f64),
}

impl Flow {
    fn of(tx: &Transaction, price: f64) -> Flow {
        let value = tx.amount * price;
        if !tx.is_no_cost() {
            Flow::Invested(tx.sign() * value)
        } else if tx.sign() > 0.0 {
            Flow::Earned(value)
        } else {
            Flow::Donated(value)
        }
    }
}

/// Everything the replay produces. Maps iterate in the order keys were first
/// seen in the ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulators {
    pub balances: OrderedMap<AssetId, f64>,
    pub weekly_valuation: OrderedMap<WeekBucket, f64>,
    /// Week total as of the latest transaction in each fiscal year. Keyed by
    /// the transaction instant, so it lines up with `by_year`.
    pub yearly_valuation: OrderedMap<FiscalYear, f64>,
    pub by_asset: OrderedMap<AssetId, Flows>,
    pub by_year: OrderedMap<FiscalYear, Flows>,
    pub by_asset_year: OrderedMap<(AssetId, FiscalYear), Flows>,
}

impl Accumulators {
    pub fn balance(&self, asset: &AssetId) -> f64 {
        self.balances.get(asset).copied().unwrap_or(0.0)
    }

    pub fn invested_sum(&self) -> f64 {
        self.by_asset.values().map(|f| f.invested).sum()
    }

    pub fn earned_sum(&self) -> f64 {
        self.by_asset.values().map(|f| f.earned).sum()
    }

    pub fn donated_sum(&self) -> f64 {
        self.by_asset.values().map(|f| f.donated).sum()
    }

    pub fn year_flows(&self, year: &FiscalYear) -> Flows {
        self.by_year.get(year).copied().unwrap_or_default()
    }
}

pub struct LedgerReplay<'a> {
    oracle: &'a PriceOracle<'a>,
    resolver: &'a SymbolResolver<'a>,
    acc: Accumulators,
}

impl<'a> LedgerReplay<'a> {
    pub fn new(oracle: &'a PriceOracle<'a>, resolver: &'a SymbolResolver<'a>) -> Self {
        Self {
            oracle,
            resolver,
            acc: Accumulators::default(),
        }
    }

    /// Folds one transaction. An unresolvable label aborts the replay, since
    /// balances would silently go wrong otherwise.
    pub async fn apply(&mut self, tx: &Transaction) -> Result<()> {
        let asset = self
            .resolver
            .resolve(&tx.asset_label)
            .await?
            .found()
            .ok_or_else(|| Error::SymbolNotFound {
                label: tx.asset_label.clone(),
            })?;

        *self.acc.balances.entry_or_default(asset.clone()) += tx.signed_amount();
        self.revalue(tx.timestamp).await?;
        self.record_flow(&asset, tx).await
    }

    /// Adds the value of every held asset at `instant` to that instant's week,
    /// and records the week's running total for the instant's fiscal year.
    async fn revalue(&mut self, instant: NaiveDateTime) -> Result<()> {
        let week = week_start(instant);
        for (asset, units) in self.acc.balances.iter() {
            let price = self.oracle.weekly_price(asset, instant).await?;
            if price == UNPRICED {
                debug!("No price for {} in week {}, skipping", asset, week);
                continue;
            }
            *self.acc.weekly_valuation.entry_or_default(week) += units * price;
        }
        if let Some(total) = self.acc.weekly_valuation.get(&week).copied() {
            self.acc.yearly_valuation.insert(fiscal_year(instant), total);
        }
        Ok(())
    }

    async fn record_flow(&mut self, asset: &AssetId, tx: &Transaction) -> Result<()> {
        let year = fiscal_year(tx.timestamp);
        let price = self.oracle.weekly_price(asset, tx.timestamp).await?;

        let by_asset = self.acc.by_asset.entry_or_default(asset.clone());
        let by_year = self.acc.by_year.entry_or_default(year);
        let by_asset_year = self.acc.by_asset_year.entry_or_default((asset.clone(), year));

        if price == UNPRICED {
            debug!(
                "No price for {} on {}, leaving it out of {} flows",
                asset, tx.timestamp, year
            );
            return Ok(());
        }

        let flow = Flow::of(tx, price);
        by_asset.add(flow);
        by_year.add(flow);
        by_asset_year.add(flow);
        Ok(())
    }

    /// Appends the valuation snapshot at `now` and returns the accumulators.
    pub async fn finish(mut self, now: NaiveDateTime) -> Result<Accumulators> {
        self.revalue(now).await?;
        Ok(self.acc)
    }
}

/// Replays `ledger` in file order from empty state.
pub async fn replay(
    ledger: &Ledger,
    oracle: &PriceOracle<'_>,
    resolver: &SymbolResolver<'_>,
    now: NaiveDateTime,
) -> Result<Accumulators> {
    info!("Replaying {} transactions", ledger.len());
    let mut replay = LedgerReplay::new(oracle, resolver);
    for (i, tx) in ledger.iter().enumerate() {
        if let Err(e) = replay.apply(tx).await {
            warn!("Replay stopped at ledger row {}: {}", i + 1, e);
            return Err(e);
        }
    }
    let acc = replay.finish(now).await?;
    debug!(
        "Replay done: {} assets, {} weeks, {} outbound calls",
        acc.balances.len(),
        acc.weekly_valuation.len(),
        oracle.outbound_calls()
    );
    Ok(acc)
}
