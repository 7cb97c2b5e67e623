//! Maps free-text ledger labels such as `"BTC (Bitcoin)"` to catalog asset ids.

use crate::core::error::Result;
use crate::core::price::AssetId;
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::debug;

/// One entry of the market-data catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[async_trait]
pub trait AssetCatalogProvider: Send + Sync {
    async fn fetch_catalog(&self) -> anyhow::Result<Vec<CatalogEntry>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(AssetId),
    NotFound,
}

impl Resolution {
    pub fn found(self) -> Option<AssetId> {
        match self {
            Resolution::Found(id) => Some(id),
            Resolution::NotFound => None,
        }
    }
}

/// Built-in overrides for tickers the catalog no longer lists under their
/// old symbol.
pub const DEFAULT_OVERRIDES: &[(&str, &str)] = &[("erd", "elrond")];

/// Reduces a label to its bare symbol: text before the first `(`, trimmed,
/// lowercased, with every non-alphanumeric character removed.
pub fn normalize_label(label: &str) -> String {
    label
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Resolves labels through the override table first and the catalog second.
///
/// The catalog is fetched on first use and kept. Catalog matching is a linear
/// scan and the first entry whose symbol matches wins, so when the catalog
/// lists a symbol twice the result follows the catalog's own ordering.
pub struct SymbolResolver<'a> {
    catalog_provider: &'a dyn AssetCatalogProvider,
    catalog: OnceCell<Vec<CatalogEntry>>,
    overrides: HashMap<String, AssetId>,
}

impl<'a> SymbolResolver<'a> {
    pub fn new(catalog_provider: &'a dyn AssetCatalogProvider) -> Self {
        let overrides = DEFAULT_OVERRIDES
            .iter()
            .map(|(label, id)| (normalize_label(label), AssetId::new(id)))
            .collect();
        Self {
            catalog_provider,
            catalog: OnceCell::new(),
            overrides,
        }
    }

    /// Adds overrides on top of the built-in ones. Keys are normalized like
    /// ledger labels.
    pub fn with_overrides<'b, I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'b String, &'b String)>,
    {
        for (label, id) in overrides {
            self.overrides.insert(normalize_label(label), AssetId::new(id));
        }
        self
    }

    async fn catalog(&self) -> Result<&[CatalogEntry]> {
        let catalog = self
            .catalog
            .get_or_try_init(move || async move {
                let entries = self
                    .catalog_provider
                    .fetch_catalog()
                    .await
                    .context("Failed to fetch asset catalog")?;
                debug!("Loaded asset catalog with {} entries", entries.len());
                Ok::<_, anyhow::Error>(entries)
            })
            .await?;
        Ok(catalog)
    }

    pub async fn resolve(&self, label: &str) -> Result<Resolution> {
        let symbol = normalize_label(label);
        if let Some(id) = self.overrides.get(&symbol) {
            debug!("Resolved {} to {} via override", label, id);
            return Ok(Resolution::Found(id.clone()));
        }

        let catalog = self.catalog().await?;
        let found = catalog
            .iter()
            .find(|entry| entry.symbol.to_lowercase() == symbol)
            .map(|entry| AssetId::new(&entry.id));

        match found {
            Some(id) => {
                debug!("Resolved {} to {}", label, id);
                Ok(Resolution::Found(id))
            }
            None => {
                debug!("No catalog entry for {} (symbol {})", label, symbol);
                Ok(Resolution::NotFound)
            }
        }
    }
}
