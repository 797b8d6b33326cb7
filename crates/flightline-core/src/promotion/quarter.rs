use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar quarter used to schedule selection boards.
///
/// Ordered by [`Quarter::ordinal`], so `Q4 2024 < Q1 2025`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Quarter {
    pub year: i32,
    /// 1 through 4.
    pub quarter: u8,
}

impl Quarter {
    /// Quarter containing `date`: Jan-Mar is Q1, Apr-Jun Q2, Jul-Sep Q3, Oct-Dec Q4.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month0() / 3 + 1) as u8,
        }
    }

    pub fn previous(&self) -> Self {
        if self.quarter == 1 {
            Self { year: self.year - 1, quarter: 4 }
        } else {
            Self { year: self.year, quarter: self.quarter - 1 }
        }
    }

    pub fn next(&self) -> Self {
        if self.quarter == 4 {
            Self { year: self.year + 1, quarter: 1 }
        } else {
            Self { year: self.year, quarter: self.quarter + 1 }
        }
    }

    /// `year * 4 + quarter`, a total order over quarters.
    pub fn ordinal(&self) -> i64 {
        i64::from(self.year) * 4 + i64::from(self.quarter)
    }
}

impl Ord for Quarter {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal().cmp(&other.ordinal())
    }
}

impl PartialOrd for Quarter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} {}", self.quarter, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_quarter_of_month_boundaries() {
        assert_eq!(Quarter::of(date(2025, 1, 1)), Quarter { year: 2025, quarter: 1 });
        assert_eq!(Quarter::of(date(2025, 3, 31)), Quarter { year: 2025, quarter: 1 });
        assert_eq!(Quarter::of(date(2025, 4, 1)), Quarter { year: 2025, quarter: 2 });
        assert_eq!(Quarter::of(date(2025, 6, 30)), Quarter { year: 2025, quarter: 2 });
        assert_eq!(Quarter::of(date(2025, 7, 1)), Quarter { year: 2025, quarter: 3 });
        assert_eq!(Quarter::of(date(2025, 9, 30)), Quarter { year: 2025, quarter: 3 });
        assert_eq!(Quarter::of(date(2025, 10, 1)), Quarter { year: 2025, quarter: 4 });
        assert_eq!(Quarter::of(date(2025, 12, 31)), Quarter { year: 2025, quarter: 4 });
    }

    #[test]
    fn test_previous_wraps_year() {
        let q1 = Quarter { year: 2025, quarter: 1 };
        assert_eq!(q1.previous(), Quarter { year: 2024, quarter: 4 });
        let q3 = Quarter { year: 2025, quarter: 3 };
        assert_eq!(q3.previous(), Quarter { year: 2025, quarter: 2 });
    }

    #[test]
    fn test_next_wraps_year() {
        let q4 = Quarter { year: 2025, quarter: 4 };
        assert_eq!(q4.next(), Quarter { year: 2026, quarter: 1 });
        let q2 = Quarter { year: 2025, quarter: 2 };
        assert_eq!(q2.next(), Quarter { year: 2025, quarter: 3 });
    }

    #[test]
    fn test_ordinal_orders_across_years() {
        let q4 = Quarter { year: 2024, quarter: 4 };
        let q1 = Quarter { year: 2025, quarter: 1 };
        assert_eq!(q1.ordinal() - q4.ordinal(), 1);
        assert!(q4 < q1);
        assert_eq!(q4.next().previous(), q4);
    }

    #[test]
    fn test_display() {
        assert_eq!(Quarter { year: 2025, quarter: 3 }.to_string(), "Q3 2025");
    }
}
