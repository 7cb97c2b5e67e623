//! Caching facade over the market-data collaborators.
//!
//! Each asset's full price history is fetched and aggregated into weekly means
//! at most once, on the first weekly lookup for that asset. Spot prices are
//! likewise fetched once per asset and kept for the lifetime of the oracle.
//! Failed fetches are not cached.

use crate::core::aggregate::{PriceTable, aggregate_weekly};
use crate::core::cache::OnceCache;
use crate::core::error::Result;
use crate::core::price::{AssetId, PriceHistoryProvider, SpotPriceProvider};
use anyhow::Context;
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

pub struct PriceOracle<'a> {
    history_provider: &'a dyn PriceHistoryProvider,
    spot_provider: &'a dyn SpotPriceProvider,
    weekly: OnceCache<AssetId, Arc<PriceTable>>,
    spot: OnceCache<AssetId, f64>,
    outbound_calls: AtomicUsize,
}

impl<'a> PriceOracle<'a> {
    pub fn new(
        history_provider: &'a dyn PriceHistoryProvider,
        spot_provider: &'a dyn SpotPriceProvider,
    ) -> Self {
        Self {
            history_provider,
            spot_provider,
            weekly: OnceCache::new(),
            spot: OnceCache::new(),
            outbound_calls: AtomicUsize::new(0),
        }
    }

    /// Weekly mean prices of `asset`, fetching and aggregating its history on
    /// first use.
    pub async fn price_table(&self, asset: &AssetId) -> Result<Arc<PriceTable>> {
        let table = self
            .weekly
            .get_or_try_init(asset, move || async move {
                self.outbound_calls.fetch_add(1, Ordering::SeqCst);
                let samples = self
                    .history_provider
                    .fetch_history(asset)
                    .await
                    .with_context(|| format!("Failed to fetch price history for {asset}"))?;
                let sample_count = samples.len();
                let table = aggregate_weekly(samples);
                debug!(
                    "Aggregated {} samples for {} into {} weeks",
                    sample_count,
                    asset,
                    table.len()
                );
                Ok::<_, anyhow::Error>(Arc::new(table))
            })
            .await?;
        Ok(table)
    }

    /// Mean price of `asset` over the week containing `instant`. Returns
    /// [`UNPRICED`](crate::core::aggregate::UNPRICED) if that week has no
    /// samples.
    pub async fn weekly_price(&self, asset: &AssetId, instant: NaiveDateTime) -> Result<f64> {
        let table = self.price_table(asset).await?;
        Ok(table.price_at(instant))
    }

    pub async fn spot_price(&self, asset: &AssetId) -> Result<f64> {
        let price = self
            .spot
            .get_or_try_init(asset, move || async move {
                self.outbound_calls.fetch_add(1, Ordering::SeqCst);
                self.spot_provider
                    .fetch_spot(asset)
                    .await
                    .with_context(|| format!("Failed to fetch spot price for {asset}"))
            })
            .await?;
        Ok(price)
    }

    /// Number of requests issued to the collaborators so far, failed ones
    /// included.
    pub fn outbound_calls(&self) -> usize {
        self.outbound_calls.load(Ordering::SeqCst)
    }
}
