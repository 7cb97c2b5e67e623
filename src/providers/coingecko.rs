use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::price::{AssetId, PriceHistoryProvider, PriceSample, SpotPriceProvider};
use crate::core::resolver::{AssetCatalogProvider, CatalogEntry};
use crate::providers::util::with_retry;

/// CoinGecko public API. Prices are quoted in `vs_currency`.
pub struct CoinGeckoProvider {
    base_url: String,
    vs_currency: String,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, vs_currency: &str) -> Self {
        CoinGeckoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            vs_currency: vs_currency.to_lowercase(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        debug!("Requesting {} from {}", what, url);

        let client = reqwest::Client::builder()
            .user_agent("ledgerfolio/1.0")
            .build()?;
        let response = with_retry(|| async { client.get(url).send().await }, 3, 500)
            .await
            .with_context(|| format!("Failed to send request for {what}"))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} for {}", response.status(), what));
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for {what}"))?;
        serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", what, e))
    }
}

#[derive(Deserialize, Debug)]
struct MarketChartResponse {
    prices: Vec<(f64, f64)>,
}

#[async_trait]
impl AssetCatalogProvider for CoinGeckoProvider {
    #[instrument(name = "CoinGeckoCatalogFetch", skip(self))]
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>> {
        let url = format!("{}/api/v3/coins/list", self.base_url);
        self.get_json(&url, "coin list").await
    }
}

#[async_trait]
impl PriceHistoryProvider for CoinGeckoProvider {
    #[instrument(name = "CoinGeckoHistoryFetch", skip(self), fields(asset = %asset))]
    async fn fetch_history(&self, asset: &AssetId) -> Result<Vec<PriceSample>> {
        let url = format!(
            "{}/api/v3/coins/{}/market_chart?vs_currency={}&days=max",
            self.base_url, asset, self.vs_currency
        );
        let chart: MarketChartResponse = self
            .get_json(&url, &format!("price history of {asset}"))
            .await?;

        chart
            .prices
            .into_iter()
            .map(|(millis, price)| {
                DateTime::from_timestamp_millis(millis as i64)
                    .map(|dt| PriceSample {
                        timestamp: dt.naive_utc(),
                        price,
                    })
                    .ok_or_else(|| anyhow!("Invalid timestamp {} for {}", millis, asset))
            })
            .collect()
    }
}

#[async_trait]
impl SpotPriceProvider for CoinGeckoProvider {
    #[instrument(name = "CoinGeckoSpotFetch", skip(self), fields(asset = %asset))]
    async fn fetch_spot(&self, asset: &AssetId) -> Result<f64> {
        let url = format!(
            "{}/api/v3/simple/price?ids={}&vs_currencies={}",
            self.base_url, asset, self.vs_currency
        );
        let prices: HashMap<String, HashMap<String, f64>> = self
            .get_json(&url, &format!("spot price of {asset}"))
            .await?;

        prices
            .get(asset.as_str())
            .and_then(|quotes| quotes.get(&self.vs_currency))
            .copied()
            .ok_or_else(|| {
                anyhow!(
                    "No spot price found for {} in {}",
                    asset,
                    self.vs_currency
                )
            })
    }
}
