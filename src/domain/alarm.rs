/// Alarm entity for reminders
///
/// An alarm is persisted here and scheduled with an external timer service.
/// When the timer fires, the alarm's optional active window decides whether
/// a notification is shown.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Unique identifier for an alarm record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(pub i64);

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hours of the day during which an alarm may notify
///
/// `from > to` describes a window that wraps past midnight (22:00 to 06:00).
/// Both ends are inclusive and compared at minute precision, so 06:00:30 is
/// still inside a window ending at 06:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: NaiveTime,
    pub to: NaiveTime,
}

impl TimeWindow {
    pub fn new(from: NaiveTime, to: NaiveTime) -> Self {
        Self { from, to }
    }

    /// Parse a pair of `HH:MM` strings
    pub fn parse(from: &str, to: &str) -> Result<Self, DomainError> {
        Ok(Self {
            from: parse_clock_time(from)?,
            to: parse_clock_time(to)?,
        })
    }

    pub fn contains(&self, now: NaiveTime) -> bool {
        let (from, to) = (minute_of_day(self.from), minute_of_day(self.to));
        let now = minute_of_day(now);
        if from <= to {
            now >= from && now <= to
        } else {
            now >= from || now <= to
        }
    }
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn parse_clock_time(s: &str) -> Result<NaiveTime, DomainError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| DomainError::InvalidTime(format!("'{}' (expected HH:MM)", s)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: AlarmId,
    /// Unique name, also used as the scheduler's timer name
    pub name: String,
    /// First fire time in epoch milliseconds
    pub first_fire_ms: i64,
    /// Repeat period; `None` fires once
    pub interval_minutes: Option<u32>,
    pub window: Option<TimeWindow>,
}

impl Alarm {
    /// Whether a firing at `now` should notify the user
    pub fn is_active_at(&self, now: NaiveTime) -> bool {
        self.window.map(|window| window.contains(now)).unwrap_or(true)
    }
}

/// Validated input for creating an alarm
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlarm {
    pub name: String,
    pub first_fire_ms: i64,
    pub interval_minutes: Option<u32>,
    pub window: Option<TimeWindow>,
}

impl NewAlarm {
    pub fn new(
        name: &str,
        first_fire_ms: i64,
        interval_minutes: Option<u32>,
        window: Option<TimeWindow>,
    ) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation {
                message: "Alarm name cannot be empty".to_string(),
            });
        }

        if interval_minutes == Some(0) {
            return Err(DomainError::InvalidValue {
                message: "Alarm interval must be at least 1 minute".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            first_fire_ms,
            interval_minutes,
            window,
        })
    }
}

/// What the user sees when an alarm rings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn for_alarm(name: &str) -> Self {
        Self {
            title: "Alarm Reminder".to_string(),
            message: format!("Alarm: {} is ringing!", name),
        }
    }
}
