//! Date parsing and calendar-window helpers

use chrono::{Datelike, Days, NaiveDate};

/// Earliest year accepted for monthly reports.
const MIN_REPORT_YEAR: i32 = 2020;

/// Parse a user-supplied date in `YYYY-MM-DD`, `DD/MM/YYYY` or `DD-MM-YYYY`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    None
}

/// Parse a `MM/YYYY` month selector.
pub fn parse_month(text: &str) -> Option<(i32, u32)> {
    let (month, year) = text.trim().split_once('/')?;
    let month: u32 = month.trim().parse().ok()?;
    let year: i32 = year.trim().parse().ok()?;
    if !(1..=12).contains(&month) || year < MIN_REPORT_YEAR {
        return None;
    }
    Some((year, month))
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// Sunday of the week starting at `week_start`.
pub fn week_end(week_start: NaiveDate) -> NaiveDate {
    week_start + Days::new(6)
}

/// First and last day of the given month, or `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_month - Days::new(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_date_supported_formats() {
        assert_eq!(parse_date("2026-03-02"), Some(d(2026, 3, 2)));
        assert_eq!(parse_date("02/03/2026"), Some(d(2026, 3, 2)));
        assert_eq!(parse_date("02-03-2026"), Some(d(2026, 3, 2)));
        assert_eq!(parse_date("  2026-03-02  "), Some(d(2026, 3, 2)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2026-13-02"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("02/2026"), Some((2026, 2)));
        assert_eq!(parse_month("12/2020"), Some((2020, 12)));
        assert_eq!(parse_month("13/2026"), None);
        assert_eq!(parse_month("02/2019"), None);
        assert_eq!(parse_month("february"), None);
    }

    #[test]
    fn test_week_window() {
        // 2026-03-04 is a Wednesday.
        let wednesday = d(2026, 3, 4);
        assert_eq!(week_start(wednesday), d(2026, 3, 2));
        assert_eq!(week_end(week_start(wednesday)), d(2026, 3, 8));

        let monday = d(2026, 3, 2);
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(2026, 2), Some((d(2026, 2, 1), d(2026, 2, 28))));
        assert_eq!(month_bounds(2024, 2), Some((d(2024, 2, 1), d(2024, 2, 29))));
        assert_eq!(
            month_bounds(2026, 12),
            Some((d(2026, 12, 1), d(2026, 12, 31)))
        );
        assert_eq!(month_bounds(2026, 13), None);
    }
}
