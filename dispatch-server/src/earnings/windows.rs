//! Rolling earnings windows
//!
//! Windows are always recomputed from immutable `DeliveryCredited` events,
//! bucketed into the partner's local calendar relative to `now`. Nothing is
//! decremented in place, so a rollover is just another recomputation.

use chrono_tz::Tz;
use rust_decimal::Decimal;
use shared::partner::{EarningsWindows, PartnerEvent, PartnerEventPayload};

use crate::utils::time::{local_date, month_start, week_start};

/// One credited delivery
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Credit {
    pub amount: Decimal,
    pub delivered_at: i64,
}

/// Credits recorded in a partner event stream
pub fn credits_from_events<'a>(events: impl IntoIterator<Item = &'a PartnerEvent>) -> Vec<Credit> {
    events
        .into_iter()
        .filter_map(|event| match &event.payload {
            PartnerEventPayload::DeliveryCredited {
                amount,
                delivered_at,
                ..
            } => Some(Credit {
                amount: *amount,
                delivered_at: *delivered_at,
            }),
            _ => None,
        })
        .collect()
}

/// Bucket credits into today / this ISO week / this month as of `now_millis`
///
/// Credits dated after `now` (clock skew between nodes) count toward the
/// buckets they fall in, never beyond the current month.
pub fn compute_windows(credits: &[Credit], tz: Tz, now_millis: i64) -> EarningsWindows {
    let today = local_date(now_millis, tz);
    let week = week_start(today);
    let month = month_start(today);

    let mut windows = EarningsWindows {
        day: Some(today),
        week_start: Some(week),
        month_start: Some(month),
        ..EarningsWindows::default()
    };

    for credit in credits {
        let date = local_date(credit.delivered_at, tz);
        if date == today {
            windows.today += credit.amount;
            windows.today_deliveries += 1;
        }
        if week_start(date) == week {
            windows.weekly += credit.amount;
        }
        if month_start(date) == month {
            windows.monthly += credit.amount;
        }
    }

    windows
}

/// True when the stored windows belong to an earlier local day than `now`
pub fn is_stale(windows: &EarningsWindows, tz: Tz, now_millis: i64) -> bool {
    windows.day != Some(local_date(now_millis, tz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const IST: Tz = chrono_tz::Asia::Kolkata;

    fn at(y: i32, m: u32, d: u32, h: u32) -> i64 {
        IST.with_ymd_and_hms(y, m, d, h, 0, 0)
            .single()
            .unwrap()
            .timestamp_millis()
    }

    fn credit(amount: i64, delivered_at: i64) -> Credit {
        Credit {
            amount: Decimal::from(amount),
            delivered_at,
        }
    }

    #[test]
    fn test_bucketing_by_local_calendar() {
        // Thursday 2026-03-12
        let now = at(2026, 3, 12, 18);
        let credits = vec![
            credit(40, at(2026, 3, 12, 9)),  // today
            credit(30, at(2026, 3, 10, 13)), // same week
            credit(20, at(2026, 3, 2, 13)),  // same month, previous week
            credit(10, at(2026, 2, 27, 13)), // previous month
        ];

        let windows = compute_windows(&credits, IST, now);
        assert_eq!(windows.today, Decimal::from(40));
        assert_eq!(windows.today_deliveries, 1);
        assert_eq!(windows.weekly, Decimal::from(70));
        assert_eq!(windows.monthly, Decimal::from(90));
        assert_eq!(windows.week_start, chrono::NaiveDate::from_ymd_opt(2026, 3, 9));
    }

    #[test]
    fn test_rollover_at_local_midnight() {
        let credits = vec![credit(40, at(2026, 3, 12, 23))];

        let before = compute_windows(&credits, IST, at(2026, 3, 12, 23) + 30 * 60 * 1000);
        assert_eq!(before.today, Decimal::from(40));

        let after = compute_windows(&credits, IST, at(2026, 3, 13, 1));
        assert_eq!(after.today, Decimal::ZERO);
        assert_eq!(after.today_deliveries, 0);
        assert_eq!(after.weekly, Decimal::from(40));
        assert!(is_stale(&before, IST, at(2026, 3, 13, 1)));
        assert!(!is_stale(&after, IST, at(2026, 3, 13, 1)));
    }

    #[test]
    fn test_week_boundary_crosses_month() {
        // Sunday 2026-03-01 belongs to the ISO week starting Monday 2026-02-23
        let credits = vec![credit(25, at(2026, 2, 27, 12))];
        let windows = compute_windows(&credits, IST, at(2026, 3, 1, 12));
        assert_eq!(windows.weekly, Decimal::from(25));
        assert_eq!(windows.monthly, Decimal::ZERO);
    }

    #[test]
    fn test_no_credits() {
        let windows = compute_windows(&[], IST, at(2026, 3, 12, 12));
        assert_eq!(windows.today, Decimal::ZERO);
        assert_eq!(windows.monthly, Decimal::ZERO);
        assert!(windows.day.is_some());
    }
}
