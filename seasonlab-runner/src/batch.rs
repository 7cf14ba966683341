//! Batch orchestration: ingest a whole tabular file, split it by symbol,
//! and run the per-symbol pipeline for each, sequentially or in parallel.
//!
//! One symbol's compute failure never aborts the batch; it lands in the
//! report's `failed` list and the remaining symbols proceed. Validation
//! failures (bad headers, too many bad rows) abort before anything runs.

use blake3::Hasher;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use seasonlab_core::error::{RowError, ValidationError};
use seasonlab_core::ingest::{
    normalize_series, prevalidate, transform_row, HeaderMap, RawTable, DEFAULT_ROW_ERROR_LIMIT,
};
use seasonlab_core::planner;
use seasonlab_core::progress::ProgressSink;
use seasonlab_core::store::SeasonalStore;

use crate::pipeline::{run_symbol_pipeline, PipelineOptions, SymbolOutcome};

/// Errors that abort a batch before any symbol runs.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Knobs for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Symbol used for files without a symbol column.
    pub default_symbol: Option<String>,
    pub row_error_limit: usize,
    pub chunk_size: usize,
    pub lookback_months: u32,
    pub force: bool,
    /// Run symbols on the rayon pool instead of sequentially.
    pub parallel: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            default_symbol: None,
            row_error_limit: DEFAULT_ROW_ERROR_LIMIT,
            chunk_size: 500,
            lookback_months: planner::DEFAULT_LOOKBACK_MONTHS,
            force: false,
            parallel: false,
        }
    }
}

impl BatchOptions {
    fn pipeline(&self) -> PipelineOptions {
        PipelineOptions {
            chunk_size: self.chunk_size,
            lookback_months: self.lookback_months,
            force: self.force,
        }
    }
}

/// A symbol whose pipeline failed after validation passed.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: String,
}

/// What a batch run did, suitable for printing or serializing.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<SymbolOutcome>,
    pub failed: Vec<SymbolFailure>,
    /// Rows skipped during transformation, with line numbers.
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Content hash of the normalized input, for change detection across runs.
    pub dataset_hash: String,
    pub cancelled: bool,
}

/// Ingest `table` and run every symbol it contains against `store`.
///
/// `cancel` is checked between symbols (sequential) or at each task's start
/// (parallel); a cancelled run returns the partial report with `cancelled`
/// set rather than an error.
pub fn run_batch(
    table: &RawTable,
    opts: &BatchOptions,
    store: &dyn SeasonalStore,
    progress: &dyn ProgressSink,
    cancel: Option<&AtomicBool>,
) -> Result<BatchReport, BatchError> {
    let headers = HeaderMap::resolve(&table.headers);
    let default_symbol = opts.default_symbol.as_deref();

    progress.report(0, "validating input");
    // Prevalidation catches fatal shape problems (missing columns, empty
    // input, too many bad rows) before any transformation or write.
    prevalidate(table, &headers, default_symbol, opts.row_error_limit)?;

    // Transform, collecting the authoritative per-row errors. Prevalidation
    // bounds how many there can be; transformation can only find the same
    // rows bad plus symbol-resolution failures.
    let mut records = Vec::with_capacity(table.records.len());
    let mut row_errors = Vec::new();
    for (i, record) in table.records.iter().enumerate() {
        match transform_row(record, &headers, default_symbol, i + 1) {
            Ok(rec) => records.push(rec),
            Err(e) => row_errors.push(e),
        }
    }
    if row_errors.len() > opts.row_error_limit {
        return Err(ValidationError::TooManyRowErrors {
            count: row_errors.len(),
            limit: opts.row_error_limit,
            first: row_errors
                .first()
                .map(|e| format!("row {}: {}", e.line, e.message))
                .unwrap_or_default(),
        }
        .into());
    }

    let rows_read = table.records.len();
    let rows_used = records.len();
    progress.report(
        10,
        &format!("{rows_used}/{rows_read} rows usable, normalizing"),
    );

    let by_symbol = normalize_series(records);
    let dataset_hash = hash_series(&by_symbol);

    let mut report = BatchReport {
        row_errors,
        rows_read,
        rows_used,
        dataset_hash,
        ..BatchReport::default()
    };

    let pipeline_opts = opts.pipeline();
    let symbols: Vec<(&String, &Vec<_>)> = by_symbol.iter().collect();

    if opts.parallel {
        use rayon::prelude::*;
        let results: Vec<_> = symbols
            .par_iter()
            .map(|(symbol, series)| {
                if is_cancelled(cancel) {
                    return None;
                }
                Some((
                    symbol.as_str(),
                    run_symbol_pipeline(symbol, series, store, &pipeline_opts, progress),
                ))
            })
            .collect();
        for entry in results {
            match entry {
                None => report.cancelled = true,
                Some((_, Ok(outcome))) => report.outcomes.push(outcome),
                Some((symbol, Err(e))) => report.failed.push(SymbolFailure {
                    symbol: symbol.to_string(),
                    error: e.to_string(),
                }),
            }
        }
    } else {
        for (symbol, series) in symbols {
            if is_cancelled(cancel) {
                report.cancelled = true;
                break;
            }
            match run_symbol_pipeline(symbol, series, store, &pipeline_opts, progress) {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => report.failed.push(SymbolFailure {
                    symbol: symbol.clone(),
                    error: e.to_string(),
                }),
            }
        }
    }

    progress.report(
        100,
        &format!(
            "batch done: {} ok, {} failed",
            report.outcomes.len(),
            report.failed.len()
        ),
    );
    Ok(report)
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
}

/// Content hash of the normalized series, stable across input orderings
/// because normalization sorts by (symbol, date).
fn hash_series(
    by_symbol: &std::collections::BTreeMap<String, Vec<seasonlab_core::domain::CanonicalRecord>>,
) -> String {
    let mut hasher = Hasher::new();
    for (symbol, series) in by_symbol {
        hasher.update(symbol.as_bytes());
        for record in series {
            // Infallible for these types; an empty update would only weaken
            // the hash, not corrupt the store.
            if let Ok(bytes) = serde_json::to_vec(record) {
                hasher.update(&bytes);
            }
        }
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use seasonlab_core::domain::{DerivedRow, RecalcMode, Timeframe};
    use seasonlab_core::progress::NoopProgress;
    use seasonlab_core::store::{MemoryStore, SeasonalStore, StoreError, UpsertStats};

    /// Store whose writes fail for one symbol; everything else passes
    /// through to an inner [`MemoryStore`].
    struct FailingFor {
        inner: MemoryStore,
        symbol: &'static str,
    }

    impl SeasonalStore for FailingFor {
        fn latest_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StoreError> {
            self.inner.latest_date(symbol)
        }

        fn count_rows(&self, symbol: &str, timeframe: Timeframe) -> Result<u64, StoreError> {
            self.inner.count_rows(symbol, timeframe)
        }

        fn delete_from(
            &self,
            symbol: &str,
            timeframe: Timeframe,
            from: NaiveDate,
        ) -> Result<u64, StoreError> {
            self.inner.delete_from(symbol, timeframe, from)
        }

        fn upsert_chunk(
            &self,
            symbol: &str,
            timeframe: Timeframe,
            rows: &[DerivedRow],
        ) -> Result<UpsertStats, StoreError> {
            if symbol == self.symbol {
                return Err(StoreError::Io("disk full".into()));
            }
            self.inner.upsert_chunk(symbol, timeframe, rows)
        }
    }

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            records: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn two_symbol_table() -> RawTable {
        table(
            &["Date", "Symbol", "Close", "Volume"],
            &[
                &["2024-01-01", "NIFTY", "100", "10"],
                &["2024-01-02", "NIFTY", "102", "12"],
                &["2024-01-03", "NIFTY", "101", "9"],
                &["2024-01-01", "BANKNIFTY", "200", "5"],
                &["2024-01-02", "BANKNIFTY", "210", "6"],
            ],
        )
    }

    #[test]
    fn batch_runs_every_symbol() {
        let store = MemoryStore::new();
        let report = run_batch(
            &two_symbol_table(),
            &BatchOptions::default(),
            &store,
            &NoopProgress,
            None,
        )
        .unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(report.rows_read, 5);
        assert_eq!(report.rows_used, 5);
        assert_eq!(store.count_rows("NIFTY", Timeframe::Daily).unwrap(), 3);
        assert_eq!(store.count_rows("BANKNIFTY", Timeframe::Daily).unwrap(), 2);
    }

    #[test]
    fn bad_rows_are_reported_and_skipped() {
        let store = MemoryStore::new();
        let t = table(
            &["Date", "Symbol", "Close"],
            &[
                &["2024-01-01", "NIFTY", "100"],
                &["garbage", "NIFTY", "101"],
                &["2024-01-03", "NIFTY", "102"],
            ],
        );
        let report =
            run_batch(&t, &BatchOptions::default(), &store, &NoopProgress, None).unwrap();
        assert_eq!(report.row_errors.len(), 1);
        assert_eq!(report.row_errors[0].line, 2);
        assert_eq!(report.rows_used, 2);
        assert_eq!(store.count_rows("NIFTY", Timeframe::Daily).unwrap(), 2);
    }

    #[test]
    fn one_failing_symbol_does_not_abort_the_others() {
        let store = FailingFor {
            inner: MemoryStore::new(),
            symbol: "NIFTY",
        };
        let report = run_batch(
            &two_symbol_table(),
            &BatchOptions::default(),
            &store,
            &NoopProgress,
            None,
        )
        .unwrap();

        // NIFTY's store failure lands in `failed`; BANKNIFTY still ran
        // to completion and its rows were persisted.
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].symbol, "NIFTY");
        assert!(report.failed[0].error.contains("disk full"));
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].symbol, "BANKNIFTY");
        assert_eq!(
            store.inner.count_rows("BANKNIFTY", Timeframe::Daily).unwrap(),
            2
        );
        assert_eq!(store.inner.count_rows("NIFTY", Timeframe::Daily).unwrap(), 0);
    }

    #[test]
    fn missing_close_column_aborts_the_batch() {
        let store = MemoryStore::new();
        let t = table(&["Date", "Symbol"], &[&["2024-01-01", "NIFTY"]]);
        let err = run_batch(&t, &BatchOptions::default(), &store, &NoopProgress, None)
            .unwrap_err();
        assert!(matches!(
            err,
            BatchError::Validation(ValidationError::MissingColumn("close"))
        ));
    }

    #[test]
    fn dataset_hash_ignores_input_ordering() {
        let store = MemoryStore::new();
        let a = run_batch(
            &two_symbol_table(),
            &BatchOptions::default(),
            &store,
            &NoopProgress,
            None,
        )
        .unwrap();

        let mut shuffled = two_symbol_table();
        shuffled.records.reverse();
        let b = run_batch(
            &shuffled,
            &BatchOptions {
                force: true,
                ..BatchOptions::default()
            },
            &store,
            &NoopProgress,
            None,
        )
        .unwrap();

        assert_eq!(a.dataset_hash, b.dataset_hash);
    }

    #[test]
    fn cancellation_stops_between_symbols() {
        let store = MemoryStore::new();
        let cancel = AtomicBool::new(true);
        let report = run_batch(
            &two_symbol_table(),
            &BatchOptions::default(),
            &store,
            &NoopProgress,
            Some(&cancel),
        )
        .unwrap();
        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn parallel_batch_matches_sequential() {
        let seq_store = MemoryStore::new();
        let par_store = MemoryStore::new();
        let t = two_symbol_table();

        run_batch(&t, &BatchOptions::default(), &seq_store, &NoopProgress, None).unwrap();
        run_batch(
            &t,
            &BatchOptions {
                parallel: true,
                ..BatchOptions::default()
            },
            &par_store,
            &NoopProgress,
            None,
        )
        .unwrap();

        for tf in Timeframe::ALL {
            assert_eq!(
                seq_store.count_rows("NIFTY", tf).unwrap(),
                par_store.count_rows("NIFTY", tf).unwrap()
            );
        }
    }

    #[test]
    fn rerun_without_changes_skips_all_symbols() {
        let store = MemoryStore::new();
        let t = two_symbol_table();
        run_batch(&t, &BatchOptions::default(), &store, &NoopProgress, None).unwrap();
        let report =
            run_batch(&t, &BatchOptions::default(), &store, &NoopProgress, None).unwrap();
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.mode == RecalcMode::Skip));
    }
}
