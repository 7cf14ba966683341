//! Mandatory pre-validation: scan the whole batch before any transformation
//! or write. The engine never persists a partially-valid file.

use crate::error::{RowError, ValidationError};
use crate::ingest::date::parse_date;
use crate::ingest::header::{col, HeaderMap};
use crate::ingest::row::parse_number;

/// Row-error collection bound: errors beyond this fail the whole batch.
pub const DEFAULT_ROW_ERROR_LIMIT: usize = 50;

/// A parsed tabular input: header names plus string records.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

/// Scan every row for date/close/symbol presence before transformation.
///
/// Fails the batch when a required column cannot be resolved, when the
/// input has no data rows, or when the number of bad rows exceeds
/// `error_limit`. Otherwise returns the (bounded) list of row errors so
/// the caller can skip those rows and surface the problems together.
pub fn prevalidate(
    table: &RawTable,
    headers: &HeaderMap,
    default_symbol: Option<&str>,
    error_limit: usize,
) -> Result<Vec<RowError>, ValidationError> {
    if headers.index_of(col::DATE).is_none() {
        return Err(ValidationError::MissingColumn("date"));
    }
    if headers.index_of(col::CLOSE).is_none() {
        return Err(ValidationError::MissingColumn("close"));
    }
    if headers.index_of(col::SYMBOL).is_none() && default_symbol.is_none() {
        return Err(ValidationError::MissingColumn("symbol"));
    }
    if table.records.is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let mut errors = Vec::new();
    let mut error_count = 0usize;

    for (i, record) in table.records.iter().enumerate() {
        let line = i + 1;
        let problem = check_row(record, headers);
        if let Some(message) = problem {
            error_count += 1;
            if errors.len() < error_limit {
                errors.push(RowError {
                    line,
                    symbol: headers.get(record, col::SYMBOL).map(str::to_string),
                    message,
                });
            }
        }
        if error_count > error_limit {
            return Err(ValidationError::TooManyRowErrors {
                count: error_count,
                limit: error_limit,
                first: errors
                    .first()
                    .map(|e| format!("row {}: {}", e.line, e.message))
                    .unwrap_or_default(),
            });
        }
    }

    Ok(errors)
}

fn check_row<S: AsRef<str>>(record: &[S], headers: &HeaderMap) -> Option<String> {
    match headers.get(record, col::DATE) {
        None => return Some("missing date value".into()),
        Some(text) if parse_date(text).is_none() => {
            return Some(format!("unparseable date '{text}'"))
        }
        Some(_) => {}
    }
    match headers.get(record, col::CLOSE) {
        None => return Some("missing close value".into()),
        Some(text) => match parse_number(text) {
            None => return Some(format!("unparseable close '{text}'")),
            Some(v) if v <= 0.0 => return Some(format!("non-positive close {v}")),
            Some(_) => {}
        },
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> (RawTable, HeaderMap) {
        let table = RawTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            records: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        };
        let map = HeaderMap::resolve(&table.headers);
        (table, map)
    }

    #[test]
    fn missing_required_column_fails_the_batch() {
        let (t, h) = table(&["Date", "Open"], &[&["2024-01-02", "100"]]);
        let err = prevalidate(&t, &h, Some("X"), 50).unwrap_err();
        assert!(matches!(err, ValidationError::MissingColumn("close")));
    }

    #[test]
    fn missing_symbol_column_needs_a_default() {
        let (t, h) = table(&["Date", "Close"], &[&["2024-01-02", "100"]]);
        assert!(matches!(
            prevalidate(&t, &h, None, 50),
            Err(ValidationError::MissingColumn("symbol"))
        ));
        assert!(prevalidate(&t, &h, Some("X"), 50).is_ok());
    }

    #[test]
    fn empty_input_fails() {
        let (t, h) = table(&["Date", "Close"], &[]);
        assert!(matches!(
            prevalidate(&t, &h, Some("X"), 50),
            Err(ValidationError::EmptyInput)
        ));
    }

    #[test]
    fn bad_rows_are_collected_not_fatal() {
        let (t, h) = table(
            &["Date", "Close"],
            &[
                &["2024-01-02", "100"],
                &["garbage", "101"],
                &["2024-01-04", "-5"],
            ],
        );
        let errors = prevalidate(&t, &h, Some("X"), 50).unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 2);
        assert_eq!(errors[1].line, 3);
    }

    #[test]
    fn exceeding_the_error_limit_fails_the_batch() {
        let bad: Vec<Vec<String>> = (0..5)
            .map(|_| vec!["garbage".to_string(), "100".to_string()])
            .collect();
        let t = RawTable {
            headers: vec!["Date".into(), "Close".into()],
            records: bad,
        };
        let h = HeaderMap::resolve(&t.headers);
        let err = prevalidate(&t, &h, Some("X"), 3).unwrap_err();
        match err {
            ValidationError::TooManyRowErrors { count, limit, .. } => {
                assert_eq!(limit, 3);
                assert!(count > limit);
            }
            other => panic!("expected TooManyRowErrors, got {other:?}"),
        }
    }
}
