//! Calendar bucketing: weeks start on Monday midnight, fiscal years are keyed
//! on December 26th.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A calendar week, identified by the midnight instant of its Monday.
///
/// Covers `[start, start + 7 days)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeekBucket(NaiveDateTime);

impl WeekBucket {
    pub fn start(&self) -> NaiveDateTime {
        self.0
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        week_start(instant) == *self
    }
}

impl Display for WeekBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Per-year grouping key: December 26th, midnight, of the instant's year.
///
/// This is not a real year boundary. Instants after Dec 26 still belong to
/// the same key as the rest of their calendar year; the key only has to be
/// deterministic and stable across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FiscalYear(NaiveDateTime);

impl FiscalYear {
    pub fn key(&self) -> NaiveDateTime {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl Display for FiscalYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.year())
    }
}

/// Truncates an instant to midnight of the same day.
pub fn midnight(instant: NaiveDateTime) -> NaiveDateTime {
    instant.date().and_time(NaiveTime::MIN)
}

fn weekday_index(instant: NaiveDateTime) -> i64 {
    instant.weekday().num_days_from_monday() as i64
}

pub fn week_start(instant: NaiveDateTime) -> WeekBucket {
    WeekBucket(midnight(instant) - Duration::days(weekday_index(instant)))
}

/// Exclusive upper bound of the week containing `instant`.
pub fn week_end(instant: NaiveDateTime) -> NaiveDateTime {
    midnight(instant) + Duration::days(7 - weekday_index(instant))
}

pub fn fiscal_year(instant: NaiveDateTime) -> FiscalYear {
    // Dec 26 exists in every year chrono can represent
    let key = NaiveDate::from_ymd_opt(instant.year(), 12, 26).unwrap_or(NaiveDate::MAX);
    FiscalYear(key.and_time(NaiveTime::MIN))
}
