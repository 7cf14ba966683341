//! Incremental-update planning: full recompute, bounded incremental
//! recompute, or skip, decided once per (symbol, ingestion batch).
//!
//! The incremental lookback is one year by default: weekly/monthly/yearly
//! derived fields depend on the prior period's values, and a window of at
//! least one full prior cycle guarantees every counter chain crosses a
//! reset boundary before the genuinely new rows are reached. Recomputing
//! from an arbitrary midpoint would break any row whose prior-period
//! comparison crosses the cut line.

use crate::calendar::{expiry_cycle_start, monday_anchor};
use crate::domain::{RecalcMode, RecalculationPlan};
use chrono::{Months, NaiveDate};

/// Default lookback for incremental recomputes.
pub const DEFAULT_LOOKBACK_MONTHS: u32 = 12;

/// Decide how much of a symbol's history to recompute.
///
/// - No prior persisted date → full.
/// - Newer rows exist → incremental from `last_persisted − lookback`.
/// - Prior date but empty calculated tables → full (a prior run persisted
///   raw bars but crashed before producing derived aggregates).
/// - Nothing new and calculated tables populated → skip, unless forced.
pub fn plan(
    last_persisted: Option<NaiveDate>,
    newest_incoming: Option<NaiveDate>,
    calculated_tables_empty: bool,
    lookback_months: u32,
    force: bool,
) -> RecalculationPlan {
    let Some(last) = last_persisted else {
        return RecalculationPlan::full("no prior data");
    };

    let has_newer = newest_incoming.is_some_and(|newest| newest > last);
    if has_newer {
        let write_from = last
            .checked_sub_months(Months::new(lookback_months))
            .unwrap_or(last);
        return RecalculationPlan {
            mode: RecalcMode::Incremental,
            write_from: Some(write_from),
            slice_from: Some(slice_start(write_from)),
            reason: "new rows beyond last persisted date",
        };
    }

    if calculated_tables_empty {
        return RecalculationPlan::full("calculated tables empty");
    }

    if force {
        return RecalculationPlan::full("forced");
    }

    RecalculationPlan::skip("no rows beyond last persisted date")
}

/// Widen the write boundary back to the start of every bucket that could
/// have an anchor on or after it.
///
/// A Monday-week anchored inside the write window can begin up to six days
/// earlier, and an expiry cycle opens on the Friday before its Thursday
/// anchor. Computing from the earlier of the two cycle starts guarantees
/// no bucket inside the write window is rebuilt from partial data.
pub fn slice_start(write_from: NaiveDate) -> NaiveDate {
    monday_anchor(write_from).min(expiry_cycle_start(write_from))
}
