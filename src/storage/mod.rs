/// Storage layer for persisting LifeNode data
///
/// The services are written against the traits in this module, never against
/// a concrete database, so a test double can stand in for SQLite. Each trait
/// is a plain record store with the indexed lookups its service needs; rules
/// such as upsert-on-toggle and streak caching live in the services.

pub mod memory;
pub mod migrations;
pub mod sqlite;

// Re-export the main storage types
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::domain::{
    Alarm, ChatMessage, CompletionWrite, Habit, HabitCompletion, HabitId, Month, NewAlarm,
    NewHabit, NewTask, Task, TaskId,
};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Habits table (`id`, index on `month`) and completions table (`id`, indexes
/// on `habit_id`, unique `(habit_id, date)`, `(habit_id, month)`)
#[async_trait]
pub trait HabitStorage: Send + Sync {
    /// Insert a habit and return it with its assigned id and `streak = 0`
    async fn insert_habit(
        &self,
        habit: &NewHabit,
        created_at: DateTime<Utc>,
    ) -> Result<Habit, StorageError>;

    async fn get_habit(&self, habit_id: HabitId) -> Result<Option<Habit>, StorageError>;

    /// All habits, oldest id first
    async fn list_habits(&self) -> Result<Vec<Habit>, StorageError>;

    /// Habits whose creation month is `month`
    async fn list_habits_by_month(&self, month: Month) -> Result<Vec<Habit>, StorageError>;

    /// Write the cached streak fields; `HabitNotFound` if the habit is gone
    async fn update_habit_streak(
        &self,
        habit_id: HabitId,
        streak: u32,
        last_completed: Option<NaiveDate>,
    ) -> Result<(), StorageError>;

    /// Returns whether a habit row was removed
    async fn delete_habit(&self, habit_id: HabitId) -> Result<bool, StorageError>;

    /// Apply one toggle: the completion write and the habit's new cached
    /// streak land together or not at all
    ///
    /// Fails with `HabitNotFound` if the habit is gone, and with a unique
    /// constraint error if an insert hits an existing `(habit_id, date)`.
    async fn commit_toggle(
        &self,
        write: &CompletionWrite,
        streak: u32,
        last_completed: Option<NaiveDate>,
    ) -> Result<HabitCompletion, StorageError>;

    /// Lookup through the (habit_id, date) index
    async fn find_completion(
        &self,
        habit_id: HabitId,
        date: NaiveDate,
    ) -> Result<Option<HabitCompletion>, StorageError>;

    async fn list_completions(
        &self,
        habit_id: HabitId,
    ) -> Result<Vec<HabitCompletion>, StorageError>;

    async fn list_completions_for_month(
        &self,
        habit_id: HabitId,
        month: Month,
    ) -> Result<Vec<HabitCompletion>, StorageError>;
}

/// Tasks table (`id`, index on `month`)
#[async_trait]
pub trait TaskStorage: Send + Sync {
    async fn insert_task(&self, task: &NewTask) -> Result<Task, StorageError>;

    async fn get_task(&self, task_id: TaskId) -> Result<Option<Task>, StorageError>;

    /// `TaskNotFound` if no row has the task's id
    async fn update_task(&self, task: &Task) -> Result<(), StorageError>;

    async fn delete_task(&self, task_id: TaskId) -> Result<bool, StorageError>;

    async fn list_tasks_by_month(&self, month: Month) -> Result<Vec<Task>, StorageError>;
}

/// Alarms table (`id`, unique `name`)
#[async_trait]
pub trait AlarmStorage: Send + Sync {
    async fn insert_alarm(&self, alarm: &NewAlarm) -> Result<Alarm, StorageError>;

    async fn list_alarms(&self) -> Result<Vec<Alarm>, StorageError>;

    async fn find_alarm_by_name(&self, name: &str) -> Result<Option<Alarm>, StorageError>;

    async fn delete_alarm_by_name(&self, name: &str) -> Result<bool, StorageError>;

    /// Returns how many alarms were removed
    async fn delete_all_alarms(&self) -> Result<usize, StorageError>;
}

/// Chat transcripts keyed by problem name
#[async_trait]
pub trait ChatStorage: Send + Sync {
    /// Insert or replace a transcript and mark it as the most recently saved
    async fn put_transcript(
        &self,
        problem_name: &str,
        history: &[ChatMessage],
    ) -> Result<(), StorageError>;

    async fn get_transcript(
        &self,
        problem_name: &str,
    ) -> Result<Option<Vec<ChatMessage>>, StorageError>;

    /// Problem names, least recently saved first
    async fn list_problems(&self) -> Result<Vec<String>, StorageError>;

    async fn delete_transcript(&self, problem_name: &str) -> Result<bool, StorageError>;
}
