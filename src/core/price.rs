//! Pricing abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Canonical lowercase identifier of an asset in the market-data catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: &str) -> Self {
        AssetId(id.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One observation of a raw price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

/// Supplies the complete available price history of an asset, ascending by
/// timestamp, in the configured valuation currency.
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    async fn fetch_history(&self, asset: &AssetId) -> Result<Vec<PriceSample>>;
}

/// Supplies the current market price of an asset.
#[async_trait]
pub trait SpotPriceProvider: Send + Sync {
    async fn fetch_spot(&self, asset: &AssetId) -> Result<f64>;
}
