//! Row transformation: raw tabular record → [`CanonicalRecord`].

use crate::domain::CanonicalRecord;
use crate::error::RowError;
use crate::ingest::date::parse_date;
use crate::ingest::header::{col, HeaderMap};

/// Parse a numeric field leniently: trims, strips thousands separators,
/// rejects non-finite values.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Convert one raw record into a canonical OHLCV record.
///
/// Repair rules: missing open/high/low default to close (never zero), so a
/// close-only feed still yields a usable bar; missing volume/open interest
/// default to 0. A row is invalid if its date fails to parse or close is
/// missing or non-positive. `default_symbol` covers single-instrument files
/// without a symbol column.
///
/// `line` is the 1-based data row number used in the returned [`RowError`].
pub fn transform_row<S: AsRef<str>>(
    record: &[S],
    headers: &HeaderMap,
    default_symbol: Option<&str>,
    line: usize,
) -> Result<CanonicalRecord, RowError> {
    let symbol = headers
        .get(record, col::SYMBOL)
        .map(str::to_string)
        .or_else(|| default_symbol.map(str::to_string));

    let err = |message: String| RowError {
        line,
        symbol: symbol.clone(),
        message,
    };

    let symbol = match &symbol {
        Some(s) => s.clone(),
        None => return Err(err("no symbol column and no default symbol".into())),
    };

    let date_text = headers
        .get(record, col::DATE)
        .ok_or_else(|| err("missing date value".into()))?;
    let date = parse_date(date_text)
        .ok_or_else(|| err(format!("unparseable date '{date_text}'")))?;

    let close_text = headers
        .get(record, col::CLOSE)
        .ok_or_else(|| err("missing close value".into()))?;
    let close = parse_number(close_text)
        .ok_or_else(|| err(format!("unparseable close '{close_text}'")))?;
    if close <= 0.0 {
        return Err(err(format!("non-positive close {close}")));
    }

    let price_or_close = |role| {
        headers
            .get(record, role)
            .and_then(parse_number)
            .filter(|v| *v > 0.0)
            .unwrap_or(close)
    };
    let count_or_zero = |role| {
        headers
            .get(record, role)
            .and_then(parse_number)
            .filter(|v| *v >= 0.0)
            .map(|v| v as u64)
            .unwrap_or(0)
    };

    Ok(CanonicalRecord {
        symbol,
        date,
        open: price_or_close(col::OPEN),
        high: price_or_close(col::HIGH),
        low: price_or_close(col::LOW),
        close,
        volume: count_or_zero(col::VOLUME),
        open_interest: count_or_zero(col::OPEN_INTEREST),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn headers() -> HeaderMap {
        HeaderMap::resolve(&["Date", "Symbol", "Open", "High", "Low", "Close", "Volume", "OI"])
    }

    #[test]
    fn full_row_transforms() {
        let record = [
            "2024-01-02", "NIFTY", "100", "105.5", "98", "103", "1,50,000", "2000",
        ];
        let rec = transform_row(&record, &headers(), None, 1).unwrap();
        assert_eq!(rec.symbol, "NIFTY");
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(rec.high, 105.5);
        assert_eq!(rec.volume, 150_000);
        assert_eq!(rec.open_interest, 2000);
    }

    #[test]
    fn missing_ohl_defaults_to_close() {
        let record = ["2024-01-02", "NIFTY", "", "", "", "103", "", ""];
        let rec = transform_row(&record, &headers(), None, 1).unwrap();
        assert_eq!(rec.open, 103.0);
        assert_eq!(rec.high, 103.0);
        assert_eq!(rec.low, 103.0);
        assert_eq!(rec.volume, 0);
        assert_eq!(rec.open_interest, 0);
    }

    #[test]
    fn bad_date_is_a_row_error() {
        let record = ["not-a-date", "NIFTY", "", "", "", "103", "", ""];
        let err = transform_row(&record, &headers(), None, 7).unwrap_err();
        assert_eq!(err.line, 7);
        assert!(err.message.contains("unparseable date"));
    }

    #[test]
    fn non_positive_close_is_a_row_error() {
        let record = ["2024-01-02", "NIFTY", "", "", "", "0", "", ""];
        let err = transform_row(&record, &headers(), None, 1).unwrap_err();
        assert!(err.message.contains("non-positive close"));
    }

    #[test]
    fn default_symbol_covers_symbolless_files() {
        let map = HeaderMap::resolve(&["Date", "Close"]);
        let record = ["2024-01-02", "103"];
        let rec = transform_row(&record, &map, Some("BANKNIFTY"), 1).unwrap();
        assert_eq!(rec.symbol, "BANKNIFTY");

        let err = transform_row(&record, &map, None, 1).unwrap_err();
        assert!(err.message.contains("no symbol"));
    }

    #[test]
    fn thousands_separators_are_stripped() {
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number(""), None);
    }
}
