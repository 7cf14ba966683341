//! Ingestion: date parsing, header resolution, row transformation,
//! pre-validation, and series normalization.
//!
//! Everything here is format-agnostic: the engine sees header names and
//! string record slices, not CSV internals. The runner owns file reading.

mod date;
mod header;
mod normalize;
mod row;
mod validate;

pub use date::parse_date;
pub use header::{normalize_header, HeaderMap};
pub use normalize::normalize_series;
pub use row::{parse_number, transform_row};
pub use validate::{prevalidate, RawTable, DEFAULT_ROW_ERROR_LIMIT};
