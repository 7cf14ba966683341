//! CanonicalRecord — the fundamental ingested market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One canonical OHLCV bar for a single symbol on a single UTC calendar day.
///
/// Produced exactly once from raw input by the row transformer and never
/// mutated afterwards. Missing open/high/low are repaired to close at
/// transformation time, so a close-only feed still yields a usable bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub open_interest: u64,
}

impl CanonicalRecord {
    /// Invariant check: close strictly positive, all prices finite.
    ///
    /// The row transformer rejects rows that fail this, so downstream
    /// stages may assume it holds.
    pub fn is_sane(&self) -> bool {
        self.close > 0.0
            && self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
    }
}
