//! Persistence contract and the in-memory reference implementation.
//!
//! The engine writes through this trait only; the actual backend (JSON
//! files, a database) lives with the caller. Methods take `&self` so one
//! store can serve concurrently running symbols — implementations provide
//! their own interior mutability.

use crate::domain::{DerivedRow, Timeframe};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use thiserror::Error;

/// External store failure. Retry policy is owned by the caller, not here.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(String),

    #[error("store serialization error: {0}")]
    Serialization(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Outcome of one upsert chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertStats {
    pub inserted: u64,
    pub updated: u64,
}

impl UpsertStats {
    pub fn merge(&mut self, other: UpsertStats) {
        self.inserted += other.inserted;
        self.updated += other.updated;
    }
}

/// Keyed storage for derived timeframe rows.
///
/// Rows are keyed by (symbol, timeframe, anchor date); upserts are
/// idempotent. `upsert_chunk` is all-or-nothing: a failing chunk must
/// leave the store as if the call never happened, so a crash mid-symbol
/// leaves at most one chunk unapplied.
pub trait SeasonalStore: Send + Sync {
    /// Latest daily anchor persisted for a symbol, if any.
    fn latest_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StoreError>;

    /// Number of rows persisted for (symbol, timeframe).
    fn count_rows(&self, symbol: &str, timeframe: Timeframe) -> Result<u64, StoreError>;

    /// Delete every row with anchor ≥ `from`. Returns the deleted count.
    fn delete_from(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: NaiveDate,
    ) -> Result<u64, StoreError>;

    /// Insert or replace a chunk of rows, atomically.
    fn upsert_chunk(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        rows: &[DerivedRow],
    ) -> Result<UpsertStats, StoreError>;
}

type SeriesKey = (String, Timeframe);

/// In-memory store: the reference implementation, used by tests and
/// available as a scratch backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    series: Mutex<HashMap<SeriesKey, BTreeMap<NaiveDate, DerivedRow>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one series, ascending by anchor. Test convenience.
    pub fn rows(&self, symbol: &str, timeframe: Timeframe) -> Vec<DerivedRow> {
        self.series
            .lock()
            .map(|guard| {
                guard
                    .get(&(symbol.to_string(), timeframe))
                    .map(|m| m.values().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }
}

impl SeasonalStore for MemoryStore {
    fn latest_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StoreError> {
        let guard = self.series.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard
            .get(&(symbol.to_string(), Timeframe::Daily))
            .and_then(|m| m.keys().next_back().copied()))
    }

    fn count_rows(&self, symbol: &str, timeframe: Timeframe) -> Result<u64, StoreError> {
        let guard = self.series.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard
            .get(&(symbol.to_string(), timeframe))
            .map(|m| m.len() as u64)
            .unwrap_or(0))
    }

    fn delete_from(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: NaiveDate,
    ) -> Result<u64, StoreError> {
        let mut guard = self.series.lock().map_err(|_| StoreError::Poisoned)?;
        let Some(map) = guard.get_mut(&(symbol.to_string(), timeframe)) else {
            return Ok(0);
        };
        let removed = map.split_off(&from);
        Ok(removed.len() as u64)
    }

    fn upsert_chunk(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        rows: &[DerivedRow],
    ) -> Result<UpsertStats, StoreError> {
        let mut guard = self.series.lock().map_err(|_| StoreError::Poisoned)?;
        let map = guard
            .entry((symbol.to_string(), timeframe))
            .or_default();

        let mut stats = UpsertStats::default();
        for row in rows {
            match map.insert(row.anchor(), row.clone()) {
                Some(_) => stats.updated += 1,
                None => stats.inserted += 1,
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PeriodBar;

    fn row(anchor: NaiveDate, close: f64) -> DerivedRow {
        DerivedRow::from_bar(PeriodBar {
            anchor,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
            open_interest: 0,
        })
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn upsert_counts_inserts_and_updates() {
        let store = MemoryStore::new();
        let rows = vec![row(d(2024, 1, 1), 1.0), row(d(2024, 1, 2), 2.0)];
        let stats = store.upsert_chunk("A", Timeframe::Daily, &rows).unwrap();
        assert_eq!(stats, UpsertStats { inserted: 2, updated: 0 });

        let stats = store
            .upsert_chunk("A", Timeframe::Daily, &[row(d(2024, 1, 2), 3.0)])
            .unwrap();
        assert_eq!(stats, UpsertStats { inserted: 0, updated: 1 });
        assert_eq!(store.count_rows("A", Timeframe::Daily).unwrap(), 2);
    }

    #[test]
    fn latest_date_reads_the_daily_series() {
        let store = MemoryStore::new();
        assert_eq!(store.latest_date("A").unwrap(), None);
        store
            .upsert_chunk(
                "A",
                Timeframe::Daily,
                &[row(d(2024, 1, 1), 1.0), row(d(2024, 3, 1), 2.0)],
            )
            .unwrap();
        assert_eq!(store.latest_date("A").unwrap(), Some(d(2024, 3, 1)));
        // Other timeframes do not affect it.
        store
            .upsert_chunk("A", Timeframe::Year, &[row(d(2025, 1, 1), 2.0)])
            .unwrap();
        assert_eq!(store.latest_date("A").unwrap(), Some(d(2024, 3, 1)));
    }

    #[test]
    fn delete_from_removes_the_tail_only() {
        let store = MemoryStore::new();
        let rows: Vec<_> = (1..=5).map(|i| row(d(2024, 1, i), i as f64)).collect();
        store.upsert_chunk("A", Timeframe::Daily, &rows).unwrap();

        let deleted = store
            .delete_from("A", Timeframe::Daily, d(2024, 1, 3))
            .unwrap();
        assert_eq!(deleted, 3);
        let remaining = store.rows("A", Timeframe::Daily);
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|r| r.anchor() < d(2024, 1, 3)));
    }

    #[test]
    fn symbols_are_isolated() {
        let store = MemoryStore::new();
        store
            .upsert_chunk("A", Timeframe::Daily, &[row(d(2024, 1, 1), 1.0)])
            .unwrap();
        assert_eq!(store.count_rows("B", Timeframe::Daily).unwrap(), 0);
    }
}
