//! Per-symbol pipeline: plan → slice → aggregate → derive → persist.
//!
//! Within one symbol the stages are strictly sequential; each stage's
//! output is the next stage's sole input. The only I/O stage is
//! persistence, where writes per timeframe are grouped into bounded-size
//! chunks, each applied as one all-or-nothing write, so a crash mid-symbol
//! leaves at most one chunk partially applied.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use seasonlab_core::aggregate::aggregate;
use seasonlab_core::derive::{derive, DerivedSet};
use seasonlab_core::domain::{CanonicalRecord, DerivedRow, RecalcMode, Timeframe};
use seasonlab_core::error::ComputeError;
use seasonlab_core::planner;
use seasonlab_core::progress::ProgressSink;
use seasonlab_core::store::{SeasonalStore, StoreError, UpsertStats};

/// Errors from the per-symbol pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Compute(#[from] ComputeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Knobs for a pipeline run. Defaults match [`crate::RunnerConfig`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub chunk_size: usize,
    pub lookback_months: u32,
    pub force: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            lookback_months: planner::DEFAULT_LOOKBACK_MONTHS,
            force: false,
        }
    }
}

/// Result of one symbol's pipeline run, merged into the batch report.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub mode: RecalcMode,
    pub reason: &'static str,
    pub inserted: u64,
    pub updated: u64,
    /// Rows written per timeframe, keyed by the stable storage name.
    pub derived_counts: BTreeMap<&'static str, u64>,
}

impl SymbolOutcome {
    fn skipped(symbol: &str, reason: &'static str) -> Self {
        Self {
            symbol: symbol.to_string(),
            mode: RecalcMode::Skip,
            reason,
            inserted: 0,
            updated: 0,
            derived_counts: BTreeMap::new(),
        }
    }
}

/// Run the full pipeline for one symbol.
///
/// `records` must already be normalized: ascending, one row per date. The
/// batch is treated as the authoritative series; an incremental plan only
/// bounds how much of it is recomputed and rewritten.
pub fn run_symbol_pipeline(
    symbol: &str,
    records: &[CanonicalRecord],
    store: &dyn SeasonalStore,
    opts: &PipelineOptions,
    progress: &dyn ProgressSink,
) -> Result<SymbolOutcome, PipelineError> {
    if records.is_empty() {
        return Err(ComputeError::EmptySeries {
            symbol: symbol.to_string(),
        }
        .into());
    }

    progress.report(0, &format!("{symbol}: planning"));

    let last_persisted = store.latest_date(symbol)?;
    let tables_empty = aggregate_tables_empty(store, symbol)?;
    let newest_incoming = records.last().map(|r| r.date);

    let plan = planner::plan(
        last_persisted,
        newest_incoming,
        tables_empty,
        opts.lookback_months,
        opts.force,
    );
    progress.report(5, &format!("{symbol}: plan {:?} ({})", plan.mode, plan.reason));

    if plan.mode == RecalcMode::Skip {
        progress.report(100, &format!("{symbol}: up to date"));
        return Ok(SymbolOutcome::skipped(symbol, plan.reason));
    }

    // Slice the series to the computation window.
    let window = match plan.slice_from {
        Some(from) => {
            let start = records.partition_point(|r| r.date < from);
            &records[start..]
        }
        None => records,
    };
    if window.is_empty() {
        return Err(ComputeError::EmptySeries {
            symbol: symbol.to_string(),
        }
        .into());
    }

    let set = aggregate(window);
    progress.report(25, &format!("{symbol}: aggregated {} bars", window.len()));

    let derived = derive(&set);
    progress.report(55, &format!("{symbol}: derived fields computed"));

    // Rewrite boundary: everything on or after it is deleted first, so
    // stale and fresh period numbers never coexist.
    let write_from = plan.write_from;
    for timeframe in Timeframe::ALL {
        let from = write_from.unwrap_or(NaiveDate::MIN);
        store.delete_from(symbol, timeframe, from)?;
    }

    let (stats, derived_counts) =
        persist(symbol, &derived, write_from, store, opts.chunk_size, progress)?;

    progress.report(100, &format!("{symbol}: done"));

    Ok(SymbolOutcome {
        symbol: symbol.to_string(),
        mode: plan.mode,
        reason: plan.reason,
        inserted: stats.inserted,
        updated: stats.updated,
        derived_counts,
    })
}

fn aggregate_tables_empty(store: &dyn SeasonalStore, symbol: &str) -> Result<bool, StoreError> {
    for timeframe in Timeframe::AGGREGATES {
        if store.count_rows(symbol, timeframe)? > 0 {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Write all five series in bounded chunks, skipping rows before the
/// rewrite boundary (partially-covered buckets belong to intact persisted
/// rows).
fn persist(
    symbol: &str,
    derived: &DerivedSet,
    write_from: Option<NaiveDate>,
    store: &dyn SeasonalStore,
    chunk_size: usize,
    progress: &dyn ProgressSink,
) -> Result<(UpsertStats, BTreeMap<&'static str, u64>), PipelineError> {
    let chunk_size = chunk_size.max(1);
    let mut stats = UpsertStats::default();
    let mut counts = BTreeMap::new();

    for (i, timeframe) in Timeframe::ALL.into_iter().enumerate() {
        let rows = writable_rows(derived.series(timeframe), write_from);
        for chunk in rows.chunks(chunk_size) {
            stats.merge(store.upsert_chunk(symbol, timeframe, chunk)?);
        }
        counts.insert(timeframe.as_str(), rows.len() as u64);

        // 55 → 100 across the five timeframes.
        let percent = 55 + ((i + 1) * 45 / Timeframe::ALL.len()) as u8;
        progress.report(
            percent.min(99),
            &format!("{symbol}: wrote {} {timeframe} rows", rows.len()),
        );
    }

    Ok((stats, counts))
}

fn writable_rows(series: &[DerivedRow], write_from: Option<NaiveDate>) -> &[DerivedRow] {
    match write_from {
        None => series,
        Some(from) => {
            let start = series.partition_point(|r| r.anchor() < from);
            &series[start..]
        }
    }
}
