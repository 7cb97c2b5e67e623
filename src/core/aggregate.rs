//! Streams a raw price series into per-week mean prices.

use crate::core::calendar::{WeekBucket, week_start};
use crate::core::mean;
use crate::core::price::PriceSample;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Price returned for weeks with no observed sample. Callers must treat it as
/// "unpriced" and leave it out of any sum.
pub const UNPRICED: f64 = 0.0;

/// Weekly mean prices of one asset. Sparse: only weeks with samples exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    weeks: BTreeMap<WeekBucket, f64>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean price of the week containing `instant`, or [`UNPRICED`].
    pub fn price_at(&self, instant: NaiveDateTime) -> f64 {
        self.get(&week_start(instant)).unwrap_or(UNPRICED)
    }

    pub fn get(&self, week: &WeekBucket) -> Option<f64> {
        self.weeks.get(week).copied()
    }

    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }
}

/// Builds a [`PriceTable`] from samples in ascending timestamp order.
///
/// Only the current week's sample count and running mean are held; each
/// sample overwrites its week's entry, so the last write of a week is the
/// mean of all its samples. Samples are not sorted here.
pub fn aggregate_weekly<I>(samples: I) -> PriceTable
where
    I: IntoIterator<Item = PriceSample>,
{
    let mut table = PriceTable::new();
    let mut current: Option<WeekBucket> = None;
    let mut n = 0;
    let mut running_mean = 0.0;

    for sample in samples {
        let bucket = match current {
            Some(bucket) if bucket.contains(sample.timestamp) => bucket,
            _ => {
                n = 0;
                running_mean = 0.0;
                let bucket = week_start(sample.timestamp);
                current = Some(bucket);
                bucket
            }
        };
        running_mean = mean::fold(sample.price, n, running_mean);
        n += 1;
        table.weeks.insert(bucket, running_mean);
    }

    table
}
