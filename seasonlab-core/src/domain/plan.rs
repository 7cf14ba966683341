//! RecalculationPlan — the planner's verdict for one (symbol, batch).

use chrono::NaiveDate;
use serde::Serialize;

/// How much of a symbol's history the pipeline recomputes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecalcMode {
    Full,
    Incremental,
    Skip,
}

/// Produced once per (symbol, ingestion batch) by the planner.
///
/// For incremental plans, `slice_from` is where computation starts and
/// `write_from` is where deletion/rewriting starts. `slice_from` is always
/// on or before `write_from`: it is widened back to the enclosing
/// Monday-week and expiry-cycle starts so that every bucket whose anchor
/// falls inside the write window is rebuilt from all of its bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecalculationPlan {
    pub mode: RecalcMode,
    pub write_from: Option<NaiveDate>,
    pub slice_from: Option<NaiveDate>,
    pub reason: &'static str,
}

impl RecalculationPlan {
    pub fn skip(reason: &'static str) -> Self {
        Self {
            mode: RecalcMode::Skip,
            write_from: None,
            slice_from: None,
            reason,
        }
    }

    pub fn full(reason: &'static str) -> Self {
        Self {
            mode: RecalcMode::Full,
            write_from: None,
            slice_from: None,
            reason,
        }
    }
}
