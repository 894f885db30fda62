/// Period rules used by streak calculations
///
/// Each habit frequency maps to one rule that turns a date into a period key
/// and measures how many whole periods separate two keys. Streaks only ever
/// compare keys produced by the same rule.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};

use crate::domain::{Frequency, Month};

/// Key/distance pair for one kind of period
pub trait PeriodRule {
    type Key: Copy + Ord + fmt::Display;

    /// The period `date` falls in
    fn key(date: NaiveDate) -> Self::Key;

    /// Number of whole periods from `earlier` to `later`
    fn distance(later: Self::Key, earlier: Self::Key) -> i64;
}

/// Consecutive calendar days
pub struct DayPeriod;

impl PeriodRule for DayPeriod {
    type Key = NaiveDate;

    fn key(date: NaiveDate) -> NaiveDate {
        date
    }

    fn distance(later: NaiveDate, earlier: NaiveDate) -> i64 {
        (later - earlier).num_days()
    }
}

/// Consecutive ISO weeks (Monday based, week 1 holds the year's first Thursday)
pub struct IsoWeekPeriod;

impl PeriodRule for IsoWeekPeriod {
    type Key = IsoWeek;

    fn key(date: NaiveDate) -> IsoWeek {
        IsoWeek::of(date)
    }

    fn distance(later: IsoWeek, earlier: IsoWeek) -> i64 {
        (later.monday - earlier.monday).num_days() / 7
    }
}

/// Consecutive calendar months
pub struct MonthPeriod;

impl PeriodRule for MonthPeriod {
    type Key = Month;

    fn key(date: NaiveDate) -> Month {
        Month::of(date)
    }

    fn distance(later: Month, earlier: Month) -> i64 {
        later.months_since(earlier)
    }
}

/// An ISO week, written `YYYY-W##` using the ISO week-numbering year
///
/// Stored as the week's Monday so distances stay exact across years with
/// 53 weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IsoWeek {
    monday: NaiveDate,
}

impl IsoWeek {
    pub fn of(date: NaiveDate) -> Self {
        let offset = i64::from(date.weekday().num_days_from_monday());
        Self {
            monday: date - Duration::days(offset),
        }
    }

    /// ISO week-numbering year (may differ from the calendar year near January 1st)
    pub fn year(&self) -> i32 {
        self.monday.iso_week().year()
    }

    pub fn week(&self) -> u32 {
        self.monday.iso_week().week()
    }

    pub fn monday(&self) -> NaiveDate {
        self.monday
    }
}

impl fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year(), self.week())
    }
}

impl Frequency {
    /// Display key of the period `date` falls in (`2024-03-05`, `2024-W10`, `2024-03`)
    pub fn period_key(&self, date: NaiveDate) -> String {
        match self {
            Frequency::Daily => DayPeriod::key(date).to_string(),
            Frequency::Weekly => IsoWeekPeriod::key(date).to_string(),
            Frequency::Monthly => MonthPeriod::key(date).to_string(),
        }
    }

    /// Whole periods between the periods of two dates
    pub fn period_distance(&self, later: NaiveDate, earlier: NaiveDate) -> i64 {
        match self {
            Frequency::Daily => distance_between::<DayPeriod>(later, earlier),
            Frequency::Weekly => distance_between::<IsoWeekPeriod>(later, earlier),
            Frequency::Monthly => distance_between::<MonthPeriod>(later, earlier),
        }
    }
}

fn distance_between<R: PeriodRule>(later: NaiveDate, earlier: NaiveDate) -> i64 {
    R::distance(R::key(later), R::key(earlier))
}
