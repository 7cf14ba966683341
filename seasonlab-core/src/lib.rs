//! SeasonLab Core — the seasonality calculation engine.
//!
//! This crate turns raw daily OHLCV rows into a multi-timeframe seasonal
//! analytics dataset:
//! - Lenient multi-format date parsing and row transformation
//! - Series normalization (dedup, sort, group by symbol)
//! - Calendar-aware resampling into daily, Monday-week, expiry-week
//!   (Thursday-anchored), monthly, and yearly buckets
//! - Sequential derived-field computation (returns, parity flags,
//!   trading-day counters, cross-timeframe links)
//! - Incremental-update planning (full / bounded incremental / skip)
//! - The persistence trait the pipeline writes through

pub mod aggregate;
pub mod calendar;
pub mod derive;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod planner;
pub mod progress;
pub mod store;
