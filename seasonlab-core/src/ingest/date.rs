//! Lenient multi-format date parser.
//!
//! Real-world exports mix ISO dates, DD-MM orderings, dotted European
//! forms, month-name variants with 2- and 4-digit years, and compact
//! digits. Parsing tries a fixed, ordered list of formats and commits to
//! the first hit — a deliberate tie-break, because several formats are
//! syntactically ambiguous (`01-02-2024` could be DD-MM or MM-DD). The
//! engine commits to the DD-first interpretation, with one dedicated
//! MM/DD/YYYY rule that is accepted only when its day component is > 12
//! and therefore cannot be a DD/MM date.

use chrono::{Datelike, NaiveDate};

/// Accepted year window; anything outside is treated as a misparse and
/// the next format is tried.
const YEAR_MIN: i32 = 1900;
const YEAR_MAX: i32 = 2100;

struct FormatRule {
    fmt: &'static str,
    /// Format carries a 2-digit year that needs the 00-49/50-99 pivot.
    two_digit_year: bool,
    /// MM/DD ordering, only trusted when the day component is > 12.
    month_first: bool,
}

const fn rule(fmt: &'static str) -> FormatRule {
    FormatRule {
        fmt,
        two_digit_year: false,
        month_first: false,
    }
}

/// Strategy order matters: earlier rules win ambiguous inputs.
const RULES: [FormatRule; 14] = [
    rule("%Y-%m-%d"),
    rule("%d-%m-%Y"),
    rule("%d/%m/%Y"),
    rule("%d.%m.%Y"),
    FormatRule {
        fmt: "%d-%b-%y",
        two_digit_year: true,
        month_first: false,
    },
    FormatRule {
        fmt: "%d %b %y",
        two_digit_year: true,
        month_first: false,
    },
    rule("%d-%b-%Y"),
    rule("%d %b %Y"),
    rule("%d %B %Y"),
    rule("%Y%m%d"),
    rule("%b %d, %Y"),
    rule("%B %d, %Y"),
    FormatRule {
        fmt: "%m/%d/%Y",
        two_digit_year: false,
        month_first: true,
    },
    rule("%Y/%m/%d"),
];

/// Parse a heterogeneous textual date into a canonical UTC calendar day.
///
/// Returns `None` on total failure — it is the caller's decision whether
/// an unparseable date is fatal.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim().trim_matches('"').trim();
    if text.is_empty() {
        return None;
    }

    for rule in &RULES {
        let Ok(mut date) = NaiveDate::parse_from_str(text, rule.fmt) else {
            continue;
        };

        // chrono pivots 2-digit years at 69 (00-68 → 2000s); the engine's
        // convention is 00-49 → 2000s, 50-99 → 1900s.
        if rule.two_digit_year && (2050..=2068).contains(&date.year()) {
            date = date.with_year(date.year() - 100)?;
        }

        // A bare MM/DD match is only trustworthy when the day disambiguates
        // it from the DD/MM rules that already failed.
        if rule.month_first && date.day() <= 12 {
            continue;
        }

        if (YEAR_MIN..=YEAR_MAX).contains(&date.year()) {
            return Some(date);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn iso_format_wins_first() {
        assert_eq!(parse_date("2024-01-02"), Some(d(2024, 1, 2)));
    }

    #[test]
    fn day_first_dash_and_slash() {
        assert_eq!(parse_date("02-01-2024"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("02/01/2024"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("02.01.2024"), Some(d(2024, 1, 2)));
    }

    #[test]
    fn ambiguous_dates_commit_to_day_first() {
        // Could be Feb 1 (MM-DD) but the engine reads DD-MM: Jan 2.
        assert_eq!(parse_date("01-02-2024"), Some(d(2024, 2, 1)));
        assert_eq!(parse_date("01/02/2024"), Some(d(2024, 2, 1)));
    }

    #[test]
    fn month_first_accepted_only_when_day_disambiguates() {
        // 05/20/2024 cannot be DD/MM (month 20), so MM/DD applies.
        assert_eq!(parse_date("05/20/2024"), Some(d(2024, 5, 20)));
        // 13/05/2024 is DD/MM (day 13), never MM/DD.
        assert_eq!(parse_date("13/05/2024"), Some(d(2024, 5, 13)));
    }

    #[test]
    fn month_name_variants() {
        assert_eq!(parse_date("02-Jan-2024"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("02 Jan 2024"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("02 January 2024"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("Jan 02, 2024"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("January 2, 2024"), Some(d(2024, 1, 2)));
    }

    #[test]
    fn two_digit_years_pivot_at_50() {
        assert_eq!(parse_date("02-Jan-24"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("02-Jan-49"), Some(d(2049, 1, 2)));
        assert_eq!(parse_date("02-Jan-50"), Some(d(1950, 1, 2)));
        assert_eq!(parse_date("02-Jan-68"), Some(d(1968, 1, 2)));
        assert_eq!(parse_date("02-Jan-99"), Some(d(1999, 1, 2)));
    }

    #[test]
    fn compact_digits() {
        assert_eq!(parse_date("20240102"), Some(d(2024, 1, 2)));
    }

    #[test]
    fn fallback_slash_iso() {
        assert_eq!(parse_date("2024/01/02"), Some(d(2024, 1, 2)));
    }

    #[test]
    fn whitespace_and_quotes_are_stripped() {
        assert_eq!(parse_date("  2024-01-02  "), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("\"2024-01-02\""), Some(d(2024, 1, 2)));
    }

    #[test]
    fn out_of_window_years_are_rejected() {
        assert_eq!(parse_date("1899-12-31"), None);
        assert_eq!(parse_date("2101-01-01"), None);
    }

    #[test]
    fn garbage_returns_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("32/13/2024"), None);
        assert_eq!(parse_date("2024-13-40"), None);
    }

    #[test]
    fn parse_format_parse_is_idempotent() {
        for text in ["2024-01-02", "29/02/2024", "02-Jan-50", "20231231"] {
            let first = parse_date(text).unwrap();
            let formatted = first.format("%Y-%m-%d").to_string();
            assert_eq!(parse_date(&formatted), Some(first));
        }
    }
}
