//! Timeframe — the five aggregation levels of the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five output series produced per symbol.
///
/// `as_str()` values are stable storage keys; persisted data is keyed by
/// (symbol, timeframe, anchor date), so these must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Daily,
    MondayWeek,
    ExpiryWeek,
    Month,
    Year,
}

impl Timeframe {
    /// All timeframes, in dependency order for derived-field computation:
    /// daily comes last because it links to the already-computed others.
    pub const ALL: [Timeframe; 5] = [
        Timeframe::Year,
        Timeframe::Month,
        Timeframe::MondayWeek,
        Timeframe::ExpiryWeek,
        Timeframe::Daily,
    ];

    /// Stable storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Daily => "daily",
            Timeframe::MondayWeek => "monday_week",
            Timeframe::ExpiryWeek => "expiry_week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
        }
    }

    /// The four non-daily timeframes whose tables count as "calculated
    /// output" for the recalculation planner.
    pub const AGGREGATES: [Timeframe; 4] = [
        Timeframe::MondayWeek,
        Timeframe::ExpiryWeek,
        Timeframe::Month,
        Timeframe::Year,
    ];
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
