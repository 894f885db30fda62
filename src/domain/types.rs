/// Core types and enums used throughout the domain layer
///
/// This module defines the identifier types, the habit Frequency, the Month
/// key used by month-scoped queries, and the Clock that streak calculations
/// read "today" from.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::DomainError;

/// Unique identifier for a habit
///
/// Assigned by the store on creation. Ids are monotonic and never reused,
/// even after the habit is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(pub i64);

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HabitId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| DomainError::InvalidId(format!("'{}' is not a habit id", s)))
    }
}

/// Unique identifier for a habit completion record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionId(pub i64);

impl fmt::Display for CompletionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How often a habit should be performed
///
/// The frequency picks the period rule used for streaks: consecutive days,
/// consecutive ISO weeks, or consecutive calendar months. It cannot be
/// changed once the habit exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every single day
    Daily,
    /// At least once per ISO week
    Weekly,
    /// At least once per calendar month
    Monthly,
}

impl Frequency {
    /// Get the storage/display name for this frequency
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    /// Unit label used in human-readable streak output
    pub fn period_label(&self, count: u32) -> &'static str {
        match (self, count) {
            (Frequency::Daily, 1) => "day",
            (Frequency::Daily, _) => "days",
            (Frequency::Weekly, 1) => "week",
            (Frequency::Weekly, _) => "weeks",
            (Frequency::Monthly, 1) => "month",
            (Frequency::Monthly, _) => "months",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(DomainError::InvalidFrequency(format!(
                "'{}'. Valid options: daily, weekly, monthly",
                other
            ))),
        }
    }
}

/// A calendar month, written `YYYY-MM`
///
/// Completions and tasks carry the month they fall in so month views can be
/// served from an index instead of scanning dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Month {
    first_day: NaiveDate,
}

impl Month {
    /// Build a month from its year and 1-based month number
    pub fn new(year: i32, month: u32) -> Result<Self, DomainError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first_day| Self { first_day })
            .ok_or_else(|| DomainError::InvalidMonth(format!("{:04}-{:02}", year, month)))
    }

    /// The month a date falls in
    pub fn of(date: NaiveDate) -> Self {
        Self {
            first_day: date - Duration::days(i64::from(date.day0())),
        }
    }

    /// The month containing today's date according to `clock`
    pub fn current(clock: &Clock) -> Self {
        Self::of(clock.today())
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// Every date in this month, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let month = *self;
        self.first_day
            .iter_days()
            .take_while(move |day| Month::of(*day) == month)
    }

    /// Whole months from `earlier` to `self` (negative if `earlier` is later)
    pub fn months_since(&self, earlier: Month) -> i64 {
        i64::from(self.year() - earlier.year()) * 12
            + (i64::from(self.month()) - i64::from(earlier.month()))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Month::of(date) == *self
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Month {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || DomainError::InvalidMonth(format!("'{}' (expected YYYY-MM)", s));

        let (year, month) = trimmed.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Month::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a `YYYY-MM-DD` date string
pub fn parse_date(s: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::InvalidDate(format!("'{}' (expected YYYY-MM-DD)", s)))
}

/// Source of "today" for streak calculations
///
/// Production code uses the system clock (UTC date); tests pin a date so
/// gap-to-today rules are deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => Utc::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}
