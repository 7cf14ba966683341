//! Domain types: canonical records, timeframes, derived rows, plans.

mod plan;
mod record;
mod row;
mod timeframe;

pub use plan::{RecalcMode, RecalculationPlan};
pub use record::CanonicalRecord;
pub use row::{
    DailyContext, DerivedRow, PeriodBar, PeriodReturn, TradingCounters, WeekCounters, WeekLink,
};
pub use timeframe::Timeframe;
