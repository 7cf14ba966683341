//! Timeframe aggregation: daily series → five bucket sets.
//!
//! Roll-up rule, uniform across buckets: open = first bar's open,
//! high = max, low = min, close = last bar's close, volume = sum,
//! open interest = last bar's value. Periods with no trading activity
//! produce no row — series are sparse and never interpolated.

use crate::calendar::{expiry_week_anchor, monday_anchor, month_anchor, year_anchor};
use crate::domain::{CanonicalRecord, PeriodBar, Timeframe};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One sparse, ascending series of aggregated bars per timeframe.
#[derive(Debug, Clone, Default)]
pub struct AggregateSet {
    pub daily: Vec<PeriodBar>,
    pub monday_week: Vec<PeriodBar>,
    pub expiry_week: Vec<PeriodBar>,
    pub month: Vec<PeriodBar>,
    pub year: Vec<PeriodBar>,
}

impl AggregateSet {
    pub fn series(&self, timeframe: Timeframe) -> &[PeriodBar] {
        match timeframe {
            Timeframe::Daily => &self.daily,
            Timeframe::MondayWeek => &self.monday_week,
            Timeframe::ExpiryWeek => &self.expiry_week,
            Timeframe::Month => &self.month,
            Timeframe::Year => &self.year,
        }
    }
}

/// Aggregate a sorted, date-unique daily series into all five timeframes.
///
/// The input must already be normalized (ascending, one row per date);
/// the fold relies on input order for open/close/open-interest semantics.
pub fn aggregate(daily: &[CanonicalRecord]) -> AggregateSet {
    AggregateSet {
        daily: daily.iter().map(daily_bar).collect(),
        monday_week: roll_up(daily, monday_anchor),
        expiry_week: roll_up(daily, expiry_week_anchor),
        month: roll_up(daily, month_anchor),
        year: roll_up(daily, year_anchor),
    }
}

fn daily_bar(rec: &CanonicalRecord) -> PeriodBar {
    PeriodBar {
        anchor: rec.date,
        open: rec.open,
        high: rec.high,
        low: rec.low,
        close: rec.close,
        volume: rec.volume,
        open_interest: rec.open_interest,
    }
}

fn roll_up(daily: &[CanonicalRecord], anchor_of: fn(NaiveDate) -> NaiveDate) -> Vec<PeriodBar> {
    let mut buckets: BTreeMap<NaiveDate, PeriodBar> = BTreeMap::new();

    for rec in daily {
        let anchor = anchor_of(rec.date);
        buckets
            .entry(anchor)
            .and_modify(|bar| {
                bar.high = bar.high.max(rec.high);
                bar.low = bar.low.min(rec.low);
                bar.close = rec.close;
                bar.volume += rec.volume;
                bar.open_interest = rec.open_interest;
            })
            .or_insert_with(|| PeriodBar {
                anchor,
                ..daily_bar(rec)
            });
    }

    buckets.into_values().collect()
}
