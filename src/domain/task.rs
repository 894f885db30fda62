/// Task entity for the calendar's to-do list
///
/// Tasks are filed under a calendar day and fetched a month at a time.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, Month};

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| DomainError::InvalidId(format!("'{}' is not a task id", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    /// Calendar day the task is filed under
    pub created_on: NaiveDate,
    /// Month of `created_on`
    pub month: Month,
    pub completed: bool,
}

impl Task {
    /// Refile the task under another day, keeping `month` in step
    pub fn move_to(&mut self, day: NaiveDate) {
        self.created_on = day;
        self.month = Month::of(day);
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_title(&self.title).map(|_| ())
    }
}

/// Validated input for creating a task
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub created_on: NaiveDate,
    pub month: Month,
}

impl NewTask {
    pub fn new(
        title: &str,
        description: Option<String>,
        day: NaiveDate,
    ) -> Result<Self, DomainError> {
        let title = validate_title(title)?;
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            title,
            description,
            created_on: day,
            month: Month::of(day),
        })
    }
}

fn validate_title(title: &str) -> Result<String, DomainError> {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        return Err(DomainError::Validation {
            message: "Task title cannot be empty".to_string(),
        });
    }

    if trimmed.chars().count() > 200 {
        return Err(DomainError::Validation {
            message: "Task title cannot be longer than 200 characters".to_string(),
        });
    }

    Ok(trimmed.to_string())
}
