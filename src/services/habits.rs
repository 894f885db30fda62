/// Habit store: habit CRUD, completion toggling and streak caching
///
/// Every completion write goes through `toggle_habit_completion`, which
/// recomputes the habit's cached streak from its full history and stores it
/// in the same atomic write as the completion. The repair pass writes the
/// same value. Nothing else touches the streak.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::{
    Clock, CompletionWrite, Frequency, Habit, HabitCompletion, HabitId, HabitStats,
    HabitStreakView, HabitWithCompletions, Month, NewCompletion, NewHabit, StreakEngine,
};
use crate::storage::{HabitStorage, StorageError};
use crate::LifeNodeError;

/// Result of a toggle: the stored record and the habit's new streak
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleOutcome {
    pub completion: HabitCompletion,
    pub streak: u32,
}

pub struct HabitStore<S> {
    storage: Arc<S>,
    engine: StreakEngine,
    /// Held by toggle, delete and repair so their read-modify-write of the
    /// cached streak never interleaves
    write_lock: Mutex<()>,
}

impl<S: HabitStorage> HabitStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_clock(storage, Clock::System)
    }

    pub fn with_clock(storage: Arc<S>, clock: Clock) -> Self {
        Self {
            storage,
            engine: StreakEngine::new(clock),
            write_lock: Mutex::new(()),
        }
    }

    pub fn engine(&self) -> &StreakEngine {
        &self.engine
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Create a habit with `streak = 0` and `created_at = now`
    pub async fn create_habit(
        &self,
        name: &str,
        frequency: Frequency,
        month: Month,
    ) -> Result<Habit, LifeNodeError> {
        let new_habit = NewHabit::new(name, frequency, month)?;
        let habit = self.storage.insert_habit(&new_habit, Utc::now()).await?;

        tracing::info!("Created {} habit '{}' ({})", habit.frequency, habit.name, habit.id);
        Ok(habit)
    }

    pub async fn get_all_habits(&self) -> Result<Vec<Habit>, LifeNodeError> {
        Ok(self.storage.list_habits().await?)
    }

    pub async fn get_habit_by_id(&self, habit_id: HabitId) -> Result<Option<Habit>, LifeNodeError> {
        Ok(self.storage.get_habit(habit_id).await?)
    }

    pub async fn get_habits_created_in(&self, month: Month) -> Result<Vec<Habit>, LifeNodeError> {
        Ok(self.storage.list_habits_by_month(month).await?)
    }

    /// Delete a habit and all of its completions
    ///
    /// Failures are logged and reported as `false`. An id with no habit
    /// behind it deletes nothing and reports `true`.
    pub async fn delete_habit(&self, habit_id: HabitId) -> bool {
        let _guard = self.write_lock.lock().await;

        match self.storage.delete_habit(habit_id).await {
            Ok(removed) => {
                if !removed {
                    tracing::debug!("Delete of habit {}: no such habit", habit_id);
                }
                true
            }
            Err(e) => {
                tracing::error!("Error deleting habit {}: {}", habit_id, e);
                false
            }
        }
    }

    pub async fn get_habit_completions(
        &self,
        habit_id: HabitId,
    ) -> Result<Vec<HabitCompletion>, LifeNodeError> {
        Ok(self.storage.list_completions(habit_id).await?)
    }

    pub async fn get_habit_completions_for_month(
        &self,
        habit_id: HabitId,
        month: Month,
    ) -> Result<Vec<HabitCompletion>, LifeNodeError> {
        Ok(self.storage.list_completions_for_month(habit_id, month).await?)
    }

    /// Every habit, whatever its creation month, with that month's completions
    pub async fn get_habits_for_month(
        &self,
        month: Month,
    ) -> Result<Vec<HabitWithCompletions>, LifeNodeError> {
        let habits = self.storage.list_habits().await?;
        let storage = &self.storage;

        let views = try_join_all(habits.into_iter().map(|habit| async move {
            let completions = storage.list_completions_for_month(habit.id, month).await?;
            Ok::<_, StorageError>(HabitWithCompletions::new(habit, completions))
        }))
        .await?;

        Ok(views)
    }

    /// Month view plus the cached current streak and the longest streak
    /// over each habit's whole history
    pub async fn get_habits_for_month_with_streaks(
        &self,
        month: Month,
    ) -> Result<Vec<HabitStreakView>, LifeNodeError> {
        let month_views = self.get_habits_for_month(month).await?;
        let storage = &self.storage;
        let engine = &self.engine;

        let views = try_join_all(month_views.into_iter().map(|view| async move {
            let history = storage.list_completions(view.habit.id).await?;
            let longest_streak = engine.longest_streak(&history, view.habit.frequency);
            Ok::<_, StorageError>(HabitStreakView {
                current_streak: view.habit.streak,
                longest_streak,
                habit: view,
            })
        }))
        .await?;

        Ok(views)
    }

    /// Flip the completion for `(habit_id, date)` and refresh the streak
    ///
    /// The first toggle of a day stores a completed record; later toggles
    /// flip that same record. An unknown habit fails before anything is
    /// written.
    pub async fn toggle_habit_completion(
        &self,
        habit_id: HabitId,
        date: NaiveDate,
    ) -> Result<ToggleOutcome, LifeNodeError> {
        let _guard = self.write_lock.lock().await;

        let habit = self
            .storage
            .get_habit(habit_id)
            .await?
            .ok_or_else(|| StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            })?;

        let write = match self.storage.find_completion(habit_id, date).await? {
            Some(existing) => CompletionWrite::Update(existing.toggled()),
            None => CompletionWrite::Insert(NewCompletion::completed(habit_id, date)),
        };

        // Streak as it stands once the write lands
        let history = self.storage.list_completions(habit_id).await?;
        let mut completed_days: Vec<NaiveDate> = history
            .iter()
            .filter(|c| c.completed && c.date != date)
            .map(|c| c.date)
            .collect();
        if write.completed() {
            completed_days.push(date);
        }
        let streak = self
            .engine
            .current_streak_for_dates(&completed_days, habit.frequency);

        let completion = self
            .storage
            .commit_toggle(&write, streak, Some(date))
            .await?;

        tracing::debug!(
            "Toggled habit {} on {}: completed={}, streak={}",
            habit_id,
            date,
            completion.completed,
            streak
        );

        Ok(ToggleOutcome { completion, streak })
    }

    /// Statistics for one habit, `None` if it does not exist
    pub async fn get_habit_stats(
        &self,
        habit_id: HabitId,
    ) -> Result<Option<HabitStats>, LifeNodeError> {
        let Some(habit) = self.storage.get_habit(habit_id).await? else {
            return Ok(None);
        };

        let completions = self.storage.list_completions(habit_id).await?;
        Ok(Some(self.engine.habit_stats(&habit, &completions)))
    }

    /// Rewrite every cached streak from its history
    ///
    /// Returns how many habits had a stale value.
    pub async fn recompute_streaks(&self) -> Result<usize, LifeNodeError> {
        let _guard = self.write_lock.lock().await;

        let mut changed = 0;
        for habit in self.storage.list_habits().await? {
            let history = self.storage.list_completions(habit.id).await?;
            let streak = self.engine.current_streak(&history, habit.frequency);

            if streak != habit.streak {
                tracing::warn!(
                    "Repairing streak for habit {}: cached {}, actual {}",
                    habit.id,
                    habit.streak,
                    streak
                );
                self.storage
                    .update_habit_streak(habit.id, streak, habit.last_completed)
                    .await?;
                changed += 1;
            }
        }

        Ok(changed)
    }
}
