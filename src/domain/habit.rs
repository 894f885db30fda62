/// Habit entity and related functionality
///
/// This module defines the Habit struct along with the validated NewHabit
/// input and the month-scoped views handed to calendar screens.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, Frequency, HabitCompletion, HabitId, Month};

/// A habit represents something the user wants to do regularly
///
/// `streak` is a cached copy of the current streak. It is recomputed from the
/// completion history every time a completion is toggled and is never edited
/// directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// Display name (e.g., "Exercise", "Solve two problems")
    pub name: String,
    /// How often this habit should be performed
    pub frequency: Frequency,
    /// Cached current streak in periods of `frequency`
    pub streak: u32,
    /// Date of the last toggle, informational only
    pub last_completed: Option<NaiveDate>,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
    /// Month the habit was created in
    pub month: Month,
}

/// Validated input for creating a habit
#[derive(Debug, Clone, PartialEq)]
pub struct NewHabit {
    pub name: String,
    pub frequency: Frequency,
    pub month: Month,
}

impl NewHabit {
    /// Create a new habit request with validation
    ///
    /// The name is trimmed before it is stored.
    pub fn new(name: &str, frequency: Frequency, month: Month) -> Result<Self, DomainError> {
        let name = Self::validate_name(name)?;
        Ok(Self {
            name,
            frequency,
            month,
        })
    }

    /// Validate habit name according to business rules
    fn validate_name(name: &str) -> Result<String, DomainError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be empty".to_string(),
            ));
        }

        if trimmed.chars().count() > 100 {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be longer than 100 characters".to_string(),
            ));
        }

        Ok(trimmed.to_string())
    }
}

/// A habit together with its completions for one month, keyed by date
///
/// Habits created in an earlier month still appear here with the requested
/// month's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitWithCompletions {
    #[serde(flatten)]
    pub habit: Habit,
    pub completions: BTreeMap<NaiveDate, HabitCompletion>,
}

impl HabitWithCompletions {
    pub fn new(habit: Habit, completions: Vec<HabitCompletion>) -> Self {
        let completions = completions
            .into_iter()
            .map(|completion| (completion.date, completion))
            .collect();
        Self { habit, completions }
    }

    /// Whether the habit is marked done on `date`
    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completions
            .get(&date)
            .map(|completion| completion.completed)
            .unwrap_or(false)
    }
}

/// Month view of a habit plus its streak figures, as shown on the streaks page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitStreakView {
    pub habit: HabitWithCompletions,
    pub current_streak: u32,
    pub longest_streak: u32,
}

impl HabitStreakView {
    /// A streak is "active" while the current run is the best one so far
    pub fn is_active_streak(&self) -> bool {
        self.current_streak == self.longest_streak
    }
}
