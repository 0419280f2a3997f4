//! Period window arithmetic for goal frequencies.
//!
//! Pure functions mapping an instant to the boundary of the period that
//! contains it. All arithmetic is in UTC; the service clock is treated as
//! the single timezone.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};

use super::GoalFrequency;

/// Midnight (00:00:00 UTC) of a calendar date.
pub fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Start of the period containing `now` for the given frequency.
///
/// - `Daily`: midnight of `now`'s date
/// - `Weekly`: midnight of the ISO Monday on or before `now`
/// - `Monthly`: midnight of the first of `now`'s month
pub fn period_start(frequency: GoalFrequency, now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    match frequency {
        GoalFrequency::Daily => midnight(date),
        GoalFrequency::Weekly => {
            let days_from_monday = date.weekday().num_days_from_monday() as i64;
            midnight(date) - Duration::days(days_from_monday)
        }
        GoalFrequency::Monthly => midnight(date) - Duration::days(date.day0() as i64),
    }
}

/// Half-open window `[start, end)` of the period containing `at`.
///
/// `end` is the start of the next period.
pub fn period_bounds(frequency: GoalFrequency, at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = period_start(frequency, at);
    let end = match frequency {
        GoalFrequency::Daily => start + Duration::days(1),
        GoalFrequency::Weekly => start + Duration::days(7),
        GoalFrequency::Monthly => {
            let next = start
                .date_naive()
                .checked_add_months(Months::new(1))
                .expect("month arithmetic overflow");
            midnight(next)
        }
    };
    (start, end)
}
