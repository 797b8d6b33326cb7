//! Source of "today" for eligibility and promotion processing.
//!
//! The engine never reads the wall clock itself. Callers take one reading per
//! batch and pass the date down, so every member in a sweep is judged against
//! the same day.

use chrono::{Local, NaiveDate};

pub trait Clock: Send + Sync {
    /// Current calendar date, no time of day.
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date, for tests and replaying a past sweep.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
