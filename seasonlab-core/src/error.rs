//! Error taxonomy for the calculation engine.
//!
//! Row-level problems are recoverable data ([`RowError`]), batch-level
//! problems are fatal for the whole file ([`ValidationError`], nothing
//! written), and computation problems are fatal per symbol only
//! ([`ComputeError`], other symbols continue). Store failures live in
//! [`crate::store::StoreError`] and are propagated to the caller.

use serde::Serialize;
use thiserror::Error;

/// A single skippable row problem, collected up to a configured limit.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    /// 1-based data row number (excluding the header).
    pub line: usize,
    pub symbol: Option<String>,
    pub message: String,
}

/// Batch-level validation failure. Raised by the mandatory pre-validation
/// scan before anything is transformed or written.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("missing required column: `{0}`")]
    MissingColumn(&'static str),

    #[error("input contains no data rows")]
    EmptyInput,

    #[error("{count} row errors exceed the limit of {limit}; first: {first}")]
    TooManyRowErrors {
        count: usize,
        limit: usize,
        first: String,
    },
}

/// Unexpected state during aggregation or derivation. Fatal for the
/// affected symbol; other symbols in the same batch continue.
#[derive(Debug, Clone, Error)]
pub enum ComputeError {
    #[error("symbol '{symbol}': no rows survived filtering, nothing to compute")]
    EmptySeries { symbol: String },
}
