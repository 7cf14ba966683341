//! Calendar anchors for the four aggregate timeframes.
//!
//! Every bucket is identified by its anchor date. Week buckets use two
//! different anchoring schemes: Monday-weeks anchor on the Monday of the
//! ISO week, expiry-weeks anchor on a Thursday, modeling an options-expiry
//! cycle that runs Friday through Thursday.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Monday of the ISO week containing `date`.
pub fn monday_anchor(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_monday() as u64;
    date - Days::new(back)
}

/// Thursday anchor of the expiry cycle containing `date`.
///
/// The anchor is the Thursday on or after `date`, except that a Friday bar
/// belongs to the *following* Thursday (6 days later): Friday starts a new
/// expiry cycle rather than closing the current one.
pub fn expiry_week_anchor(date: NaiveDate) -> NaiveDate {
    let forward = match date.weekday() {
        Weekday::Fri => 6,
        w => {
            let thu = Weekday::Thu.num_days_from_monday() as i64;
            (thu - w.num_days_from_monday() as i64).rem_euclid(7) as u64
        }
    };
    date + Days::new(forward)
}

/// The Friday that opens the expiry cycle containing `date`.
///
/// Used by the incremental planner to widen its computation slice so that
/// no expiry bucket inside the rewrite window is rebuilt from partial data.
pub fn expiry_cycle_start(date: NaiveDate) -> NaiveDate {
    expiry_week_anchor(date) - Days::new(6)
}

/// First calendar day of the bar's month.
pub fn month_anchor(date: NaiveDate) -> NaiveDate {
    // with_day(1) cannot fail for day 1
    date.with_day(1).unwrap_or(date)
}

/// Jan 1 of the bar's year.
pub fn year_anchor(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}
