//! Schedule date arithmetic
//!
//! Recurring billing works in civil dates (no timezones, no times of day).
//! The two operations the engine needs are month addition with end-of-month
//! clamping, and the two-digit year used in document numbers.

use chrono::{Datelike, Months, NaiveDate};

/// Adds whole months to a date, clamping to the last day of the target month
///
/// When the original day-of-month does not exist in the target month, the
/// result is the last valid day there: Jan 31 + 1 month is Feb 28 (Feb 29 in
/// leap years), Mar 31 + 1 month is Apr 30.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use core_kernel::add_months_clamped;
///
/// let jan31 = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
/// assert_eq!(add_months_clamped(jan31, 1), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
/// ```
pub fn add_months_clamped(date: NaiveDate, months: u32) -> NaiveDate {
    // chrono's month addition clamps to the end of the target month, which is
    // exactly the schedule-advance rule.
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// Returns the two-digit year of a date (2026 -> 26)
pub fn two_digit_year(date: NaiveDate) -> u32 {
    (date.year().rem_euclid(100)) as u32
}
