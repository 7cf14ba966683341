//! SeasonLab Runner — ingestion orchestration over `seasonlab-core`.
//!
//! This crate builds on `seasonlab-core` to provide:
//! - Per-symbol pipeline (plan, slice, aggregate, derive, persist)
//! - Batch processing of whole tabular files, sequential or parallel
//! - A JSON-file implementation of the seasonal store
//! - TOML runner configuration

pub mod batch;
pub mod config;
pub mod json_store;
pub mod pipeline;

pub use batch::{run_batch, BatchError, BatchOptions, BatchReport, SymbolFailure};
pub use config::{ConfigError, RunnerConfig};
pub use json_store::JsonStore;
pub use pipeline::{run_symbol_pipeline, PipelineError, PipelineOptions, SymbolOutcome};
