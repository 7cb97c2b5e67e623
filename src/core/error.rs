//! Error kinds surfaced by the valuation engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A ledger label could not be mapped to any catalog asset.
    #[error("Symbol not found: {label}")]
    SymbolNotFound { label: String },

    /// A derivation would divide by zero. Carries the name of the zero term.
    #[error("Division by zero: {0} is zero")]
    DivideByZero(&'static str),

    /// Current valuation over the first year's valuation is zero, negative or
    /// not finite, so no annual growth rate exists.
    #[error("Growth ratio {0} has no compound annual rate")]
    NonPositiveGrowth(f64),

    /// A market-data collaborator failed. Nothing is cached for the failed
    /// call, so it may be retried.
    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_divide_by_zero(&self) -> bool {
        matches!(self, Error::DivideByZero(_))
    }
}
