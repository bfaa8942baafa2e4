//! Semester calendar
//!
//! A semester is identified by its year and half. The first half starts on
//! February 1, the second on August 1, and every forecast is dated at one
//! of these boundaries.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half of an academic year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Half {
    /// Starts February 1
    First,
    /// Starts August 1
    Second,
}

/// A six-month reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Semester {
    year: i32,
    half: Half,
}

impl Semester {
    pub fn new(year: i32, half: Half) -> Self {
        Self { year, half }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn half(&self) -> Half {
        self.half
    }

    /// First semester whose boundary falls strictly after `date`.
    ///
    /// Dates in January or February step to August 1 of the same year,
    /// every other date steps to February 1 of the following year.
    pub fn following(date: NaiveDate) -> Self {
        if date.month() <= 2 {
            Self::new(date.year(), Half::Second)
        } else {
            Self::new(date.year() + 1, Half::First)
        }
    }

    /// The semester immediately after this one
    pub fn next(&self) -> Self {
        match self.half {
            Half::First => Self::new(self.year, Half::Second),
            Half::Second => Self::new(self.year + 1, Half::First),
        }
    }

    /// Canonical start date, `None` outside the supported calendar range
    pub fn start_date(&self) -> Option<NaiveDate> {
        let month = match self.half {
            Half::First => 2,
            Half::Second => 8,
        };
        NaiveDate::from_ymd_opt(self.year, month, 1)
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let half = match self.half {
            Half::First => 1,
            Half::Second => 2,
        };
        write!(f, "{}-S{}", self.year, half)
    }
}

/// Next semester boundary strictly after `date`
pub fn next_semester_start(date: NaiveDate) -> Option<NaiveDate> {
    Semester::following(date).start_date()
}

/// The next `horizon` semester boundaries after `last`
pub fn future_semesters(last: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(horizon);
    let mut semester = Semester::following(last);

    for _ in 0..horizon {
        let start = semester.start_date().ok_or_else(|| {
            ForecastError::InvalidParameter(format!(
                "Semester {} is outside the supported date range",
                semester
            ))
        })?;
        dates.push(start);
        semester = semester.next();
    }

    Ok(dates)
}
