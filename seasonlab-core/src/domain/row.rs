//! Derived rows — aggregated bars enriched with comparative fields.
//!
//! All comparative fields are tri-state (`Option`): the first row of a
//! series, and any row whose counter chain was broken upstream, carries
//! `None` rather than a fabricated zero. A broken chain must never be
//! silently read as day/week 0.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An aggregated OHLCV bar for one period of one timeframe.
///
/// `anchor` is the canonical date of the period: the bar's own date for
/// daily, the Monday of the ISO week, the Thursday of the expiry cycle,
/// the first of the month, or Jan 1 of the year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodBar {
    pub anchor: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub open_interest: u64,
}

/// Close-over-close comparison against the previous row of the same series.
///
/// `pct` is rounded to 2 decimals; `points` is plain subtraction. All three
/// are `None` on the first row of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodReturn {
    pub points: Option<f64>,
    pub pct: Option<f64>,
    pub positive: Option<bool>,
}

/// Week-number counters for the two week timeframes.
///
/// `monthly` resets to 1 on a month boundary, `yearly` on a year boundary;
/// otherwise each increments the previous row's value — but only if that
/// value was itself set. Parity flags are `None` whenever the counter is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekCounters {
    pub monthly: Option<u32>,
    pub yearly: Option<u32>,
    pub monthly_even: Option<bool>,
    pub yearly_even: Option<bool>,
}

/// "Nth trading day this month/year" counters, daily timeframe only.
/// Same reset-or-increment-or-none rule as [`WeekCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TradingCounters {
    pub month_day: Option<u32>,
    pub year_day: Option<u32>,
    pub month_day_even: Option<bool>,
    pub year_day_even: Option<bool>,
}

/// Snapshot of an enclosing week row, copied onto a daily row for query
/// convenience.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekLink {
    pub returns: PeriodReturn,
    pub counters: WeekCounters,
}

/// Daily-only enrichment: calendar/trading day positions and links to the
/// enclosing week/month/year rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyContext {
    /// Day of month, 1-based.
    pub calendar_month_day: u32,
    /// Ordinal day of year, 1-based.
    pub calendar_year_day: u32,
    pub trading: TradingCounters,
    pub monday_week: Option<WeekLink>,
    pub expiry_week: Option<WeekLink>,
    pub month: Option<PeriodReturn>,
    pub year: Option<PeriodReturn>,
}

/// One row of a persisted timeframe series.
///
/// The shape is uniform across timeframes so the store can key everything
/// by (symbol, timeframe, anchor): `week` is populated only for the two
/// week timeframes, `daily` only for the daily timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRow {
    #[serde(flatten)]
    pub bar: PeriodBar,
    pub returns: PeriodReturn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week: Option<WeekCounters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily: Option<DailyContext>,
}

impl DerivedRow {
    /// A row with no comparative fields yet, as produced straight from
    /// aggregation before the derived-field pass.
    pub fn from_bar(bar: PeriodBar) -> Self {
        Self {
            bar,
            returns: PeriodReturn::default(),
            week: None,
            daily: None,
        }
    }

    pub fn anchor(&self) -> NaiveDate {
        self.bar.anchor
    }
}
