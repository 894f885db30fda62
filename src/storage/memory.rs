/// In-memory habit storage
///
/// Backs the habit store in tests. It keeps the same indexes the SQLite
/// schema has and can be switched into failure modes to exercise the
/// store's error paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{
    CompletionId, CompletionWrite, Habit, HabitCompletion, HabitId, Month, NewHabit,
};
use crate::storage::{HabitStorage, StorageError};

#[derive(Default)]
struct Tables {
    next_habit_id: i64,
    next_completion_id: i64,
    habits: BTreeMap<HabitId, Habit>,
    completions: BTreeMap<CompletionId, HabitCompletion>,
}

#[derive(Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with `StorageError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make habit deletes fail
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("storage switched off".to_string()));
        }
        self.tables
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
    }

    fn check_delete(&self) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("delete rejected".to_string()));
        }
        Ok(())
    }
}

/// The error SQLite reports when the unique `(habit_id, date)` index rejects a row
fn unique_violation(message: String) -> StorageError {
    StorageError::Query(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
        Some(message),
    ))
}

#[async_trait]
impl HabitStorage for MemoryStorage {
    async fn insert_habit(
        &self,
        habit: &NewHabit,
        created_at: DateTime<Utc>,
    ) -> Result<Habit, StorageError> {
        let mut tables = self.tables()?;
        tables.next_habit_id += 1;
        let stored = Habit {
            id: HabitId(tables.next_habit_id),
            name: habit.name.clone(),
            frequency: habit.frequency,
            streak: 0,
            last_completed: None,
            created_at,
            month: habit.month,
        };
        tables.habits.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_habit(&self, habit_id: HabitId) -> Result<Option<Habit>, StorageError> {
        Ok(self.tables()?.habits.get(&habit_id).cloned())
    }

    async fn list_habits(&self) -> Result<Vec<Habit>, StorageError> {
        Ok(self.tables()?.habits.values().cloned().collect())
    }

    async fn list_habits_by_month(&self, month: Month) -> Result<Vec<Habit>, StorageError> {
        Ok(self
            .tables()?
            .habits
            .values()
            .filter(|habit| habit.month == month)
            .cloned()
            .collect())
    }

    async fn update_habit_streak(
        &self,
        habit_id: HabitId,
        streak: u32,
        last_completed: Option<NaiveDate>,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        let habit = tables
            .habits
            .get_mut(&habit_id)
            .ok_or_else(|| StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            })?;
        habit.streak = streak;
        habit.last_completed = last_completed;
        Ok(())
    }

    async fn delete_habit(&self, habit_id: HabitId) -> Result<bool, StorageError> {
        self.check_delete()?;
        let mut tables = self.tables()?;
        tables
            .completions
            .retain(|_, completion| completion.habit_id != habit_id);
        Ok(tables.habits.remove(&habit_id).is_some())
    }

    async fn commit_toggle(
        &self,
        write: &CompletionWrite,
        streak: u32,
        last_completed: Option<NaiveDate>,
    ) -> Result<HabitCompletion, StorageError> {
        let mut tables = self.tables()?;
        let habit_id = write.habit_id();

        // Every check runs before the first change
        if !tables.habits.contains_key(&habit_id) {
            return Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            });
        }

        let completion = match write {
            CompletionWrite::Insert(new) => {
                let duplicate = tables
                    .completions
                    .values()
                    .any(|c| c.habit_id == new.habit_id && c.date == new.date);
                if duplicate {
                    return Err(unique_violation(format!(
                        "UNIQUE constraint failed: habit_completions.habit_id, \
                         habit_completions.date (habit {} on {})",
                        new.habit_id, new.date
                    )));
                }

                tables.next_completion_id += 1;
                HabitCompletion {
                    id: CompletionId(tables.next_completion_id),
                    habit_id: new.habit_id,
                    date: new.date,
                    month: new.month,
                    completed: new.completed,
                }
            }
            CompletionWrite::Update(existing) => existing.clone(),
        };
        tables.completions.insert(completion.id, completion.clone());

        if let Some(habit) = tables.habits.get_mut(&habit_id) {
            habit.streak = streak;
            habit.last_completed = last_completed;
        }
        Ok(completion)
    }

    async fn find_completion(
        &self,
        habit_id: HabitId,
        date: NaiveDate,
    ) -> Result<Option<HabitCompletion>, StorageError> {
        Ok(self
            .tables()?
            .completions
            .values()
            .find(|c| c.habit_id == habit_id && c.date == date)
            .cloned())
    }

    async fn list_completions(
        &self,
        habit_id: HabitId,
    ) -> Result<Vec<HabitCompletion>, StorageError> {
        let mut completions: Vec<_> = self
            .tables()?
            .completions
            .values()
            .filter(|c| c.habit_id == habit_id)
            .cloned()
            .collect();
        completions.sort_by_key(|c| c.date);
        Ok(completions)
    }

    async fn list_completions_for_month(
        &self,
        habit_id: HabitId,
        month: Month,
    ) -> Result<Vec<HabitCompletion>, StorageError> {
        let mut completions: Vec<_> = self
            .tables()?
            .completions
            .values()
            .filter(|c| c.habit_id == habit_id && c.month == month)
            .cloned()
            .collect();
        completions.sort_by_key(|c| c.date);
        Ok(completions)
    }
}
