/// HabitCompletion entity for tracking habit completions
///
/// One record exists per (habit, date). Toggling flips `completed` on the
/// existing record instead of deleting it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{CompletionId, HabitId, Month};

/// Whether a habit was (or, after toggling back, was not) done on a day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitCompletion {
    /// Unique identifier for this record
    pub id: CompletionId,
    /// Which habit this record belongs to
    pub habit_id: HabitId,
    /// The day this record is for
    pub date: NaiveDate,
    /// Month of `date`, kept for month-scoped lookups
    pub month: Month,
    pub completed: bool,
}

impl HabitCompletion {
    /// The same record with `completed` flipped
    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }
}

/// A completion that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompletion {
    pub habit_id: HabitId,
    pub date: NaiveDate,
    pub month: Month,
    pub completed: bool,
}

impl NewCompletion {
    /// First toggle of a day: the record starts out completed
    pub fn completed(habit_id: HabitId, date: NaiveDate) -> Self {
        Self {
            habit_id,
            date,
            month: Month::of(date),
            completed: true,
        }
    }
}

/// What one toggle writes to the completions table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionWrite {
    /// First toggle of a day
    Insert(NewCompletion),
    /// A later toggle, overwriting the stored record in place
    Update(HabitCompletion),
}

impl CompletionWrite {
    pub fn habit_id(&self) -> HabitId {
        match self {
            Self::Insert(new) => new.habit_id,
            Self::Update(existing) => existing.habit_id,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Insert(new) => new.date,
            Self::Update(existing) => existing.date,
        }
    }

    /// State of the record once written
    pub fn completed(&self) -> bool {
        match self {
            Self::Insert(new) => new.completed,
            Self::Update(existing) => existing.completed,
        }
    }
}
