// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The `days` calendar days ending at `end`, oldest first.
pub fn trailing_days(end: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..i64::from(days))
        .rev()
        .map(|offset| end - Duration::days(offset))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_days_crosses_month_boundary() {
        let end = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let days = trailing_days(end, 3);
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                end,
            ]
        );
        assert!(trailing_days(end, 0).is_empty());
    }
}
