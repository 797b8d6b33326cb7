//! Month arithmetic used by the promotion rules.

use chrono::{Datelike, Days, NaiveDate};

/// Whole calendar months from `from` to `to`, ignoring the day of month.
///
/// `2025-01-31 -> 2025-02-01` counts as one month. Thresholds are judged on
/// this count, so a member can read as eligible up to a month early or late
/// near month ends.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

/// Shift `date` by `months`, letting a day past the end of the target month
/// spill into the following month (Jan 31 + 1 month = Mar 2 or 3).
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;

    // Only fails outside chrono's representable range.
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_days(Days::new(u64::from(date.day() - 1))))
        .unwrap_or(date)
}

/// The day after `date`. A period is complete the day after it is reached.
pub fn day_after(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}
