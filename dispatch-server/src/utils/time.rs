//! Calendar helpers for timezone-aware bucketing
//!
//! Timestamps are Unix millis everywhere; conversion to a local calendar
//! happens only here.

use chrono::{Datelike, NaiveDate, TimeZone};
use chrono_tz::Tz;

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.parse::<Tz>().ok()
}

/// Parse a timezone, falling back to `fallback` with a warning
pub fn timezone_or(name: &str, fallback: Tz) -> Tz {
    parse_timezone(name).unwrap_or_else(|| {
        tracing::warn!(timezone = %name, fallback = %fallback, "Unknown timezone, using fallback");
        fallback
    })
}

/// Local calendar date of a Unix millis timestamp
pub fn local_date(millis: i64, tz: Tz) -> NaiveDate {
    match tz.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.date_naive(),
        None => chrono::DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.date_naive())
            .unwrap_or_default(),
    }
}

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Local midnight of `date` as Unix millis
///
/// DST gap fallback: if local midnight does not exist, use UTC midnight.
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Duration until the next local midnight, at least one second
pub fn duration_until_next_midnight(now_millis: i64, tz: Tz) -> std::time::Duration {
    let today = local_date(now_millis, tz);
    let next = today.succ_opt().unwrap_or(today);
    let millis = day_start_millis(next, tz) - now_millis;
    std::time::Duration::from_millis(millis.max(1000) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_and_month_start() {
        // 2026-03-12 is a Thursday
        assert_eq!(week_start(date(2026, 3, 12)), date(2026, 3, 9));
        assert_eq!(week_start(date(2026, 3, 9)), date(2026, 3, 9));
        assert_eq!(month_start(date(2026, 3, 12)), date(2026, 3, 1));
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let tz: Tz = chrono_tz::Asia::Kolkata;
        // 2026-03-10 20:00 UTC is 2026-03-11 01:30 IST
        let millis = chrono::Utc
            .with_ymd_and_hms(2026, 3, 10, 20, 0, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(local_date(millis, tz), date(2026, 3, 11));
        assert_eq!(local_date(millis, chrono_tz::UTC), date(2026, 3, 10));
    }

    #[test]
    fn test_day_start_millis_round_trip() {
        let tz: Tz = chrono_tz::Asia::Kolkata;
        let start = day_start_millis(date(2026, 3, 11), tz);
        assert_eq!(local_date(start, tz), date(2026, 3, 11));
        assert_eq!(local_date(start - 1, tz), date(2026, 3, 10));
    }

    #[test]
    fn test_parse_timezone() {
        assert!(parse_timezone("Asia/Kolkata").is_some());
        assert!(parse_timezone("Mars/Olympus").is_none());
        assert_eq!(timezone_or("nope", chrono_tz::UTC), chrono_tz::UTC);
    }

    #[test]
    fn test_duration_until_next_midnight_positive() {
        let now = chrono::Utc::now().timestamp_millis();
        let d = duration_until_next_midnight(now, chrono_tz::Asia::Kolkata);
        assert!(d.as_secs() >= 1);
        assert!(d.as_secs() <= 25 * 3600);
    }
}
