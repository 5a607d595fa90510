//! Date normalizer for collaborator date strings.
//!
//! Handles:
//! - ISO dates and timestamps (2025-06-13, 2025-06-13T08:30:00Z)
//! - Display dates (13-Jun-2025, 13 June 2025)
//! - Day-first numeric dates (13-06-2025, 13/06/2025)
//! - Compact dates (20250613)
//!
//! Everything is compared as [`NaiveDate`]; strings only exist at the edges.

use chrono::{Duration, NaiveDate};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Normalize a collaborator date string. Returns `None` when unparseable.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    // ISO date, optionally followed by a time component
    if let Some(head) = s.get(..10) {
        let rest = &s[10..];
        if rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ') {
            if let Ok(date) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
                return Some(date);
            }
        }
    }

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(s, "%Y%m%d").ok();
    }

    let parts: Vec<&str> = s
        .split(['-', '/', ' '])
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 {
        return None;
    }

    let day: u32 = parts[0].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;
    if parts[2].len() != 4 {
        return None;
    }
    let month = parse_month(parts[1])?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a month given as a number (`06`) or English name (`Jun`, `June`).
fn parse_month(raw: &str) -> Option<u32> {
    if let Ok(n) = raw.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }

    let lower = raw.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| lower.starts_with(m))
        .map(|idx| idx as u32 + 1)
}

/// Parse a comma-separated date list, silently dropping malformed entries.
pub fn parse_date_list(raw: &str) -> Vec<NaiveDate> {
    raw.split(',').filter_map(normalize_date).collect()
}

/// Canonical form used for comparison and storage: `2025-06-13`.
pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Display form: `13-Jun-2025`.
pub fn format_display(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// Form expected by the submit call: `13-06-2025`.
pub fn format_submission(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Shift a date by a signed number of days, `None` on calendar overflow.
pub fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|delta| date.checked_add_signed(delta))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_dates() {
        assert_eq!(normalize_date("2025-06-13"), Some(ymd(2025, 6, 13)));
        assert_eq!(normalize_date(" 2025-06-13 "), Some(ymd(2025, 6, 13)));
        assert_eq!(normalize_date("2025-06-13T08:30:00Z"), Some(ymd(2025, 6, 13)));
        assert_eq!(normalize_date("2025-06-13 08:30"), Some(ymd(2025, 6, 13)));
    }

    #[test]
    fn test_display_dates() {
        assert_eq!(normalize_date("13-Jun-2025"), Some(ymd(2025, 6, 13)));
        assert_eq!(normalize_date("03-sep-2024"), Some(ymd(2024, 9, 3)));
        assert_eq!(normalize_date("13 June 2025"), Some(ymd(2025, 6, 13)));
    }

    #[test]
    fn test_day_first_numeric_dates() {
        assert_eq!(normalize_date("13-06-2025"), Some(ymd(2025, 6, 13)));
        assert_eq!(normalize_date("13/06/2025"), Some(ymd(2025, 6, 13)));
        assert_eq!(normalize_date("1-2-2025"), Some(ymd(2025, 2, 1)));
    }

    #[test]
    fn test_compact_dates() {
        assert_eq!(normalize_date("20250623"), Some(ymd(2025, 6, 23)));
        assert_eq!(normalize_date("20251323"), None);
    }

    #[test]
    fn test_malformed_dates() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("not a date"), None);
        assert_eq!(normalize_date("31-Feb-2025"), None);
        assert_eq!(normalize_date("13-Foo-2025"), None);
        assert_eq!(normalize_date("13-06-25"), None);
        assert_eq!(normalize_date("2025-06"), None);
    }

    #[test]
    fn test_display_normalizes_to_iso() {
        let date = normalize_date("22-May-2025").unwrap();
        assert_eq!(format_iso(date), "2025-05-22");
        assert_eq!(normalize_date(&format_iso(date)), Some(date));
    }

    #[test]
    fn test_formats() {
        let date = ymd(2025, 6, 3);
        assert_eq!(format_iso(date), "2025-06-03");
        assert_eq!(format_display(date), "03-Jun-2025");
        assert_eq!(format_submission(date), "03-06-2025");
    }

    #[test]
    fn test_parse_date_list_drops_malformed() {
        let dates = parse_date_list("2025-06-01, garbage,05-Jun-2025,,31-02-2025");
        assert_eq!(dates, vec![ymd(2025, 6, 1), ymd(2025, 6, 5)]);
    }

    #[test]
    fn test_shift_days() {
        assert_eq!(shift_days(ymd(2025, 5, 31), 1), Some(ymd(2025, 6, 1)));
        assert_eq!(shift_days(ymd(2025, 6, 1), -1), Some(ymd(2025, 5, 31)));
    }

    #[test]
    fn test_shift_days_out_of_range() {
        assert_eq!(shift_days(ymd(2025, 6, 1), 200_000_000_000_000), None);
        assert_eq!(shift_days(ymd(2025, 6, 1), i64::MAX), None);
        assert_eq!(shift_days(ymd(2025, 6, 1), i64::MIN), None);
        assert_eq!(shift_days(NaiveDate::MAX, 1), None);
    }
}
