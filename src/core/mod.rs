//! Ledger valuation engine

pub mod aggregate;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod error;
pub mod ledger;
pub mod log;
pub mod mean;
pub mod oracle;
pub mod ordered;
pub mod price;
pub mod replay;
pub mod resolver;
pub mod valuation;

// Re-export main types for cleaner imports
pub use error::{Error, Result};
pub use oracle::PriceOracle;
pub use price::{AssetId, PriceHistoryProvider, PriceSample, SpotPriceProvider};
pub use replay::{Accumulators, replay};
pub use resolver::{AssetCatalogProvider, Resolution, SymbolResolver};
pub use valuation::{CurrentValuation, PortfolioSnapshot};
