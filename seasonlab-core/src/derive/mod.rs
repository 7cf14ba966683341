//! Derived-field computation across all five timeframes.
//!
//! Timeframes are processed in dependency order — year, month,
//! Monday-week, expiry-week, then daily — because daily rows copy the
//! enclosing periods' already-computed return and week-number fields.
//! Cross-timeframe lookups go through an anchor-date index built once per
//! higher timeframe, O(1) per daily row.

mod sequence;

pub use sequence::{parity, returns_from, round2, step_counter};

use crate::aggregate::AggregateSet;
use crate::calendar::{expiry_week_anchor, monday_anchor, month_anchor, year_anchor};
use crate::domain::{
    DailyContext, DerivedRow, PeriodBar, Timeframe, TradingCounters, WeekCounters, WeekLink,
};
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

/// All five derived series for one symbol, ready for persistence.
#[derive(Debug, Clone, Default)]
pub struct DerivedSet {
    pub daily: Vec<DerivedRow>,
    pub monday_week: Vec<DerivedRow>,
    pub expiry_week: Vec<DerivedRow>,
    pub month: Vec<DerivedRow>,
    pub year: Vec<DerivedRow>,
}

impl DerivedSet {
    pub fn series(&self, timeframe: Timeframe) -> &[DerivedRow] {
        match timeframe {
            Timeframe::Daily => &self.daily,
            Timeframe::MondayWeek => &self.monday_week,
            Timeframe::ExpiryWeek => &self.expiry_week,
            Timeframe::Month => &self.month,
            Timeframe::Year => &self.year,
        }
    }

    /// Row counts per timeframe, in [`Timeframe::ALL`] order.
    pub fn counts(&self) -> [(Timeframe, usize); 5] {
        Timeframe::ALL.map(|tf| (tf, self.series(tf).len()))
    }
}

/// Compute every derived field for an aggregated symbol.
pub fn derive(set: &AggregateSet) -> DerivedSet {
    let year = derive_returns_only(&set.year);
    let month = derive_returns_only(&set.month);
    let monday_week = derive_week(&set.monday_week);
    let expiry_week = derive_week(&set.expiry_week);
    let daily = derive_daily(&set.daily, &monday_week, &expiry_week, &month, &year);

    DerivedSet {
        daily,
        monday_week,
        expiry_week,
        month,
        year,
    }
}

/// Month and year series carry returns only.
fn derive_returns_only(bars: &[PeriodBar]) -> Vec<DerivedRow> {
    let mut rows = Vec::with_capacity(bars.len());
    let mut prev_close: Option<f64> = None;

    for bar in bars {
        let mut row = DerivedRow::from_bar(bar.clone());
        row.returns = returns_from(prev_close, bar.close);
        prev_close = Some(bar.close);
        rows.push(row);
    }
    rows
}

/// Week series: returns plus monthly/yearly week-number counters.
fn derive_week(bars: &[PeriodBar]) -> Vec<DerivedRow> {
    let mut rows = Vec::with_capacity(bars.len());
    let mut prev: Option<(NaiveDate, f64, WeekCounters)> = None;

    for bar in bars {
        let mut row = DerivedRow::from_bar(bar.clone());

        let (prev_close, counters) = match &prev {
            None => (None, WeekCounters::default()),
            Some((prev_anchor, close, prev_counters)) => {
                let month_changed = (bar.anchor.year(), bar.anchor.month())
                    != (prev_anchor.year(), prev_anchor.month());
                let year_changed = bar.anchor.year() != prev_anchor.year();
                let monthly = step_counter(prev_counters.monthly, month_changed);
                let yearly = step_counter(prev_counters.yearly, year_changed);
                (
                    Some(*close),
                    WeekCounters {
                        monthly,
                        yearly,
                        monthly_even: parity(monthly),
                        yearly_even: parity(yearly),
                    },
                )
            }
        };

        row.returns = returns_from(prev_close, bar.close);
        row.week = Some(counters);
        prev = Some((bar.anchor, bar.close, counters));
        rows.push(row);
    }
    rows
}

/// Daily series: returns, calendar positions, trading-day counters, and
/// links onto the enclosing week/month/year rows.
fn derive_daily(
    bars: &[PeriodBar],
    monday_week: &[DerivedRow],
    expiry_week: &[DerivedRow],
    month: &[DerivedRow],
    year: &[DerivedRow],
) -> Vec<DerivedRow> {
    let monday_idx = anchor_index(monday_week);
    let expiry_idx = anchor_index(expiry_week);
    let month_idx = anchor_index(month);
    let year_idx = anchor_index(year);

    let mut rows = Vec::with_capacity(bars.len());
    let mut prev: Option<(NaiveDate, f64, TradingCounters)> = None;

    for bar in bars {
        let date = bar.anchor;
        let mut row = DerivedRow::from_bar(bar.clone());

        let (prev_close, trading) = match &prev {
            None => (None, TradingCounters::default()),
            Some((prev_date, close, prev_counters)) => {
                let month_changed =
                    (date.year(), date.month()) != (prev_date.year(), prev_date.month());
                let year_changed = date.year() != prev_date.year();
                let month_day = step_counter(prev_counters.month_day, month_changed);
                let year_day = step_counter(prev_counters.year_day, year_changed);
                (
                    Some(*close),
                    TradingCounters {
                        month_day,
                        year_day,
                        month_day_even: parity(month_day),
                        year_day_even: parity(year_day),
                    },
                )
            }
        };

        row.returns = returns_from(prev_close, bar.close);
        row.daily = Some(DailyContext {
            calendar_month_day: date.day(),
            calendar_year_day: date.ordinal(),
            trading,
            monday_week: monday_idx.get(&monday_anchor(date)).map(week_link),
            expiry_week: expiry_idx.get(&expiry_week_anchor(date)).map(week_link),
            month: month_idx.get(&month_anchor(date)).map(|r| r.returns),
            year: year_idx.get(&year_anchor(date)).map(|r| r.returns),
        });

        prev = Some((date, bar.close, trading));
        rows.push(row);
    }
    rows
}

fn anchor_index(rows: &[DerivedRow]) -> HashMap<NaiveDate, &DerivedRow> {
    rows.iter().map(|r| (r.anchor(), r)).collect()
}

fn week_link(row: &&DerivedRow) -> WeekLink {
    WeekLink {
        returns: row.returns,
        counters: row.week.unwrap_or_default(),
    }
}
