//! Calendar helpers for membership expiration. Every membership expires on the
//! last day of a month, whatever day the payment landed on.

use chrono::{Datelike, Months, NaiveDate};

/// Last calendar day of `date`'s month.
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let next_month_start = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };

    next_month_start
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

/// Advances `date` by `months` whole calendar months, then snaps to the end of
/// the resulting month.
///
/// - Mar 15, 2025 + 1 month = Apr 30, 2025
/// - Jan 31, 2025 + 1 month = Feb 28, 2025
/// - Dec 15, 2023 + 2 months = Feb 29, 2024
///
/// Saturates at the last representable date instead of dropping the months.
pub fn add_months_end_of_month(date: NaiveDate, months: u32) -> NaiveDate {
    // Shift from the first of the month so short target months never reject the day.
    let month_start = date.with_day(1).unwrap_or(date);
    match month_start.checked_add_months(Months::new(months)) {
        Some(shifted) => end_of_month(shifted),
        None => NaiveDate::MAX,
    }
}

pub fn is_end_of_month(date: NaiveDate) -> bool {
    end_of_month(date) == date
}

/// Whole days elapsed since `expiration_date`; negative while still current.
pub fn days_expired(expiration_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - expiration_date).num_days()
}
