//! JSON-file store: one file per (symbol, timeframe).
//!
//! Layout: `{root}/symbol={SYMBOL}/{timeframe}.json`, each file an
//! ascending array of derived rows. Writes are atomic (write to .tmp,
//! rename into place), which is what makes `upsert_chunk` all-or-nothing.

use chrono::NaiveDate;
use seasonlab_core::domain::{DerivedRow, Timeframe};
use seasonlab_core::store::{SeasonalStore, StoreError, UpsertStats};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem-backed store used by the CLI.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.root.join(format!("symbol={symbol}"))
    }

    fn series_path(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.symbol_dir(symbol).join(format!("{}.json", timeframe.as_str()))
    }

    /// Symbols present in the store, in directory order.
    pub fn symbols(&self) -> Result<Vec<String>, StoreError> {
        let mut out = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io(e.to_string()))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(symbol) = name.strip_prefix("symbol=") {
                out.push(symbol.to_string());
            }
        }
        out.sort();
        Ok(out)
    }

    fn load_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<BTreeMap<NaiveDate, DerivedRow>, StoreError> {
        let path = self.series_path(symbol, timeframe);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };
        let rows: Vec<DerivedRow> =
            serde_json::from_str(&text).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(rows.into_iter().map(|r| (r.anchor(), r)).collect())
    }

    fn write_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        series: &BTreeMap<NaiveDate, DerivedRow>,
    ) -> Result<(), StoreError> {
        let dir = self.symbol_dir(symbol);
        fs::create_dir_all(&dir).map_err(|e| StoreError::Io(e.to_string()))?;

        let rows: Vec<&DerivedRow> = series.values().collect();
        let json =
            serde_json::to_string(&rows).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let path = self.series_path(symbol, timeframe);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Io(format!("atomic rename failed: {e}"))
        })
    }
}

impl SeasonalStore for JsonStore {
    fn latest_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StoreError> {
        let series = self.load_series(symbol, Timeframe::Daily)?;
        Ok(series.keys().next_back().copied())
    }

    fn count_rows(&self, symbol: &str, timeframe: Timeframe) -> Result<u64, StoreError> {
        Ok(self.load_series(symbol, timeframe)?.len() as u64)
    }

    fn delete_from(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: NaiveDate,
    ) -> Result<u64, StoreError> {
        let mut series = self.load_series(symbol, timeframe)?;
        let removed = series.split_off(&from);
        if removed.is_empty() {
            return Ok(0);
        }
        self.write_series(symbol, timeframe, &series)?;
        Ok(removed.len() as u64)
    }

    fn upsert_chunk(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        rows: &[DerivedRow],
    ) -> Result<UpsertStats, StoreError> {
        let mut series = self.load_series(symbol, timeframe)?;
        let mut stats = UpsertStats::default();
        for row in rows {
            match series.insert(row.anchor(), row.clone()) {
                Some(_) => stats.updated += 1,
                None => stats.inserted += 1,
            }
        }
        self.write_series(symbol, timeframe, &series)?;
        Ok(stats)
    }
}
