//! Series normalization: dedup by date (keep last), sort ascending,
//! group by symbol.

use crate::domain::CanonicalRecord;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Group canonical records by symbol into ascending, date-unique series.
///
/// When the same (symbol, date) appears more than once, the last occurrence
/// in input order wins — re-uploads routinely correct earlier rows.
pub fn normalize_series(records: Vec<CanonicalRecord>) -> BTreeMap<String, Vec<CanonicalRecord>> {
    let mut by_symbol: BTreeMap<String, BTreeMap<NaiveDate, CanonicalRecord>> = BTreeMap::new();

    for record in records {
        by_symbol
            .entry(record.symbol.clone())
            .or_default()
            .insert(record.date, record);
    }

    by_symbol
        .into_iter()
        .map(|(symbol, by_date)| (symbol, by_date.into_values().collect()))
        .collect()
}
