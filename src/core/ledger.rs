//! Transaction ledger and its CSV source.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Buy,
    Sell,
}

impl From<&str> for TransactionKind {
    fn from(s: &str) -> Self {
        match s {
            "BUY" => TransactionKind::Buy,
            _ => TransactionKind::Sell,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub timestamp: NaiveDateTime,
    pub asset_label: String,
    pub amount: f64,
    /// Monetary flow of the trade. Zero marks a no-cost transfer (earn or
    /// donate).
    pub cost_or_proceeds: f64,
    pub kind: TransactionKind,
}

impl Transaction {
    /// `+1` for buys, `-1` for everything else.
    pub fn sign(&self) -> f64 {
        match self.kind {
            TransactionKind::Buy => 1.0,
            TransactionKind::Sell => -1.0,
        }
    }

    pub fn signed_amount(&self) -> f64 {
        self.sign() * self.amount
    }

    pub fn is_no_cost(&self) -> bool {
        self.cost_or_proceeds == 0.0
    }
}

#[derive(Debug, Deserialize)]
struct LedgerRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Base currency")]
    base_currency: String,
    #[serde(rename = "Base amount")]
    base_amount: f64,
    #[serde(rename = "Costs/Proceeds", default)]
    costs_or_proceeds: Option<f64>,
    #[serde(rename = "Type")]
    kind: String,
}

/// Parses the date formats seen in exchange and tracker exports. Zone offsets
/// are dropped, keeping the wall-clock time they were written in.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S %:z", "%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S %z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Ok(dt.naive_local());
        }
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| anyhow!("Unrecognised date: '{}'", raw))
}

/// Transactions in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Ledger { transactions }
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())
            .with_context(|| format!("Failed to read ledger file: {}", path.as_ref().display()))?;
        let ledger = Self::from_reader(file)
            .with_context(|| format!("Failed to parse ledger file: {}", path.as_ref().display()))?;
        debug!("Loaded {} transactions", ledger.len());
        Ok(ledger)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut transactions = Vec::new();
        for (i, record) in rdr.deserialize::<LedgerRow>().enumerate() {
            let row_number = i + 1;
            let row = record.with_context(|| format!("Invalid ledger row {row_number}"))?;
            let timestamp = parse_timestamp(&row.date)
                .with_context(|| format!("Invalid date in ledger row {row_number}"))?;
            transactions.push(Transaction {
                timestamp,
                asset_label: row.base_currency,
                amount: row.base_amount,
                cost_or_proceeds: row.costs_or_proceeds.unwrap_or(0.0),
                kind: TransactionKind::from(row.kind.as_str()),
            });
        }
        Ok(Ledger { transactions })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
