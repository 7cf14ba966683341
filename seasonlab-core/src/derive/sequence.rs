//! Sequential building blocks: running-previous-row returns and
//! reset-or-increment-or-none counters.
//!
//! Every series is processed as an ordered walk with an explicit previous
//! row. Rows are never processed in parallel within one series.

use crate::domain::PeriodReturn;

/// Round to 2 decimals with standard rounding.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Close-over-close comparison. `prev_close` is `None` on the first row,
/// which leaves all three fields unset.
pub fn returns_from(prev_close: Option<f64>, close: f64) -> PeriodReturn {
    match prev_close {
        None => PeriodReturn::default(),
        Some(prev) => {
            let points = close - prev;
            PeriodReturn {
                points: Some(points),
                pct: Some(round2(points / prev * 100.0)),
                positive: Some(points > 0.0),
            }
        }
    }
}

/// One step of a tri-state counter.
///
/// A period boundary resets the counter to 1. Inside a period the previous
/// value is incremented — but only if it was set: a broken chain is never
/// backfilled, so `None` propagates until the next boundary.
pub fn step_counter(prev: Option<u32>, period_changed: bool) -> Option<u32> {
    if period_changed {
        Some(1)
    } else {
        prev.map(|n| n + 1)
    }
}

/// Parity flag of a tri-state counter: `None` whenever the counter is.
pub fn parity(counter: Option<u32>) -> Option<bool> {
    counter.map(|n| n % 2 == 0)
}
