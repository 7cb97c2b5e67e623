//! Provides functions for deriving valuation and profitability figures from
//! the replay accumulators.
//!
//! Only [`CurrentValuation::fetch`] does I/O. Every other figure is computed
//! from values already in memory, and any zero denominator is reported as
//! [`Error::DivideByZero`] rather than returned as NaN or infinity.
use crate::core::calendar::FiscalYear;
use crate::core::error::{Error, Result};
use crate::core::oracle::PriceOracle;
use crate::core::ordered::OrderedMap;
use crate::core::price::AssetId;
use crate::core::replay::Accumulators;
use futures::future::try_join_all;
use tracing::debug;

/// Current market value of a single holding.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingValue {
    pub asset: AssetId,
    pub units: f64,
    pub price: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentValuation {
    pub holdings: Vec<HoldingValue>,
}

impl CurrentValuation {
    /// Values every balance at its spot price. Spot prices are requested
    /// concurrently; the oracle still fetches each asset at most once.
    pub async fn fetch(acc: &Accumulators, oracle: &PriceOracle<'_>) -> Result<Self> {
        let futures = acc.balances.iter().map(|(asset, units)| async move {
            let price = oracle.spot_price(asset).await?;
            Ok::<_, Error>(HoldingValue {
                asset: asset.clone(),
                units: *units,
                price,
                value: price * units,
            })
        });
        let holdings = try_join_all(futures).await?;
        debug!("Valued {} holdings at spot", holdings.len());
        Ok(CurrentValuation { holdings })
    }

    pub fn total(&self) -> f64 {
        self.holdings.iter().map(|h| h.value).sum()
    }
}

/// Replay results together with the current spot valuation.
#[derive(Debug, Clone)]
pub struct PortfolioSnapshot {
    pub accumulators: Accumulators,
    pub current: CurrentValuation,
}

impl PortfolioSnapshot {
    pub fn new(accumulators: Accumulators, current: CurrentValuation) -> Self {
        Self {
            accumulators,
            current,
        }
    }

    /// Spot value of all holdings, less everything donated.
    pub fn current_valuation_sum(&self) -> f64 {
        self.current.total() - self.accumulators.donated_sum()
    }

    pub fn total_pl(&self) -> Result<f64> {
        let basis = self.accumulators.invested_sum() + self.accumulators.earned_sum();
        if basis == 0.0 {
            return Err(Error::DivideByZero("invested plus earned"));
        }
        Ok(self.current_valuation_sum() / basis - 1.0)
    }

    /// Valuation recorded at the last transaction of each fiscal year, in
    /// encounter order.
    pub fn yearly_valuation(&self) -> &OrderedMap<FiscalYear, f64> {
        &self.accumulators.yearly_valuation
    }

    pub fn yearly_pl(&self) -> Vec<(FiscalYear, Result<f64>)> {
        self.yearly_valuation()
            .iter()
            .map(|(year, valuation)| {
                let flows = self.accumulators.year_flows(year);
                let basis = flows.invested + flows.earned;
                let pl = if basis == 0.0 {
                    Err(Error::DivideByZero("yearly invested plus earned"))
                } else {
                    Ok(valuation / basis - 1.0)
                };
                (*year, pl)
            })
            .collect()
    }

    pub fn yearly_pl_ex_earnings(&self) -> Vec<(FiscalYear, Result<f64>)> {
        self.yearly_valuation()
            .iter()
            .map(|(year, valuation)| {
                let flows = self.accumulators.year_flows(year);
                let pl = if flows.invested == 0.0 {
                    Err(Error::DivideByZero("yearly invested"))
                } else {
                    Ok((valuation - flows.earned) / flows.invested - 1.0)
                };
                (*year, pl)
            })
            .collect()
    }

    /// Ratio of each year's valuation to the previous year's. The first year
    /// has no predecessor and is left out.
    pub fn yoy_growth(&self) -> Vec<(FiscalYear, Result<f64>)> {
        let yearly = self.yearly_valuation();
        let values: Vec<(&FiscalYear, &f64)> = yearly.iter().collect();
        values
            .windows(2)
            .map(|pair| {
                let (_, previous) = pair[0];
                let (year, valuation) = pair[1];
                let growth = if *previous == 0.0 {
                    Err(Error::DivideByZero("previous year valuation"))
                } else {
                    Ok(valuation / previous)
                };
                (*year, growth)
            })
            .collect()
    }

    /// Compound annual growth from the first recorded year's valuation to the
    /// current valuation.
    pub fn cagr(&self, current_year: i32) -> Result<f64> {
        let yearly = self.yearly_valuation();
        let (first_year, first_valuation) = yearly
            .first()
            .ok_or(Error::DivideByZero("first year valuation"))?;
        if *first_valuation == 0.0 {
            return Err(Error::DivideByZero("first year valuation"));
        }
        let years_elapsed = current_year - first_year.year();
        if years_elapsed == 0 {
            return Err(Error::DivideByZero("elapsed years"));
        }
        let growth = self.current_valuation_sum() / first_valuation;
        if !growth.is_finite() || growth <= 0.0 {
            return Err(Error::NonPositiveGrowth(growth));
        }
        Ok(growth.powf(1.0 / years_elapsed as f64) - 1.0)
    }
}
