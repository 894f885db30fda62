/// SQLite implementation of the storage interfaces
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving habits, completions, tasks, alarms and chat transcripts.
/// It handles all SQL queries and data conversion.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{
    Alarm, AlarmId, ChatMessage, CompletionId, CompletionWrite, Frequency, Habit, HabitCompletion,
    HabitId, Month, NewAlarm, NewHabit, NewTask, Task, TaskId, TimeWindow,
};
use crate::storage::{
    migrations, AlarmStorage, ChatStorage, HabitStorage, StorageError, TaskStorage,
};

impl ToSql for Month {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Month {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// SQLite-based storage implementation
///
/// The connection sits behind a mutex so one storage value can be shared
/// between services and tasks. No lock is held across an await point.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    ///
    /// This opens the database file and runs any necessary migrations
    /// to ensure the schema is up to date.
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Unavailable(format!("Failed to open database: {}", e)))?;

        let storage = Self::from_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(storage)
    }

    /// Storage backed by a private in-memory database
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            StorageError::Unavailable(format!("Failed to open in-memory database: {}", e))
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute("PRAGMA foreign_keys = ON", []).map_err(|e| {
            StorageError::Unavailable(format!("Failed to enable foreign keys: {}", e))
        })?;

        migrations::initialize_database(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn write_streak(
        conn: &Connection,
        habit_id: HabitId,
        streak: u32,
        last_completed: Option<NaiveDate>,
    ) -> Result<(), StorageError> {
        let rows = conn.execute(
            "UPDATE habits SET streak = ?1, last_completed = ?2 WHERE id = ?3",
            params![streak, last_completed, habit_id.0],
        )?;

        if rows == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            });
        }

        tracing::debug!("Updated streak for habit {}: {}", habit_id, streak);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("database connection lock poisoned".to_string()))
    }

    fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
        Ok(Habit {
            id: HabitId(row.get(0)?),
            name: row.get(1)?,
            frequency: row.get(2)?,
            streak: row.get(3)?,
            last_completed: row.get(4)?,
            created_at: row.get(5)?,
            month: row.get(6)?,
        })
    }

    fn completion_from_row(row: &Row<'_>) -> rusqlite::Result<HabitCompletion> {
        Ok(HabitCompletion {
            id: CompletionId(row.get(0)?),
            habit_id: HabitId(row.get(1)?),
            date: row.get(2)?,
            month: row.get(3)?,
            completed: row.get(4)?,
        })
    }

    fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
        Ok(Task {
            id: TaskId(row.get(0)?),
            title: row.get(1)?,
            description: row.get(2)?,
            created_on: row.get(3)?,
            month: row.get(4)?,
            completed: row.get(5)?,
        })
    }

    fn alarm_from_row(row: &Row<'_>) -> rusqlite::Result<Alarm> {
        let from: Option<NaiveTime> = row.get(4)?;
        let to: Option<NaiveTime> = row.get(5)?;

        Ok(Alarm {
            id: AlarmId(row.get(0)?),
            name: row.get(1)?,
            first_fire_ms: row.get(2)?,
            interval_minutes: row.get(3)?,
            window: from.zip(to).map(|(from, to)| TimeWindow::new(from, to)),
        })
    }
}

const HABIT_COLUMNS: &str = "id, name, frequency, streak, last_completed, created_at, month";
const COMPLETION_COLUMNS: &str = "id, habit_id, date, month, completed";
const TASK_COLUMNS: &str = "id, title, description, created_on, month, completed";
const ALARM_COLUMNS: &str =
    "id, name, first_fire_ms, interval_minutes, window_from, window_to";

#[async_trait]
impl HabitStorage for SqliteStorage {
    async fn insert_habit(
        &self,
        habit: &NewHabit,
        created_at: DateTime<Utc>,
    ) -> Result<Habit, StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO habits (name, frequency, streak, last_completed, created_at, month)
             VALUES (?1, ?2, 0, NULL, ?3, ?4)",
            params![habit.name, habit.frequency, created_at, habit.month],
        )?;
        let id = HabitId(conn.last_insert_rowid());

        tracing::debug!("Created habit: {} ({})", habit.name, id);
        Ok(Habit {
            id,
            name: habit.name.clone(),
            frequency: habit.frequency,
            streak: 0,
            last_completed: None,
            created_at,
            month: habit.month,
        })
    }

    async fn get_habit(&self, habit_id: HabitId) -> Result<Option<Habit>, StorageError> {
        let conn = self.lock()?;
        let habit = conn
            .query_row(
                &format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS),
                params![habit_id.0],
                Self::habit_from_row,
            )
            .optional()?;
        Ok(habit)
    }

    async fn list_habits(&self) -> Result<Vec<Habit>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM habits ORDER BY id", HABIT_COLUMNS))?;
        let habits = stmt
            .query_map([], Self::habit_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(habits)
    }

    async fn list_habits_by_month(&self, month: Month) -> Result<Vec<Habit>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM habits WHERE month = ?1 ORDER BY id",
            HABIT_COLUMNS
        ))?;
        let habits = stmt
            .query_map(params![month], Self::habit_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(habits)
    }

    async fn update_habit_streak(
        &self,
        habit_id: HabitId,
        streak: u32,
        last_completed: Option<NaiveDate>,
    ) -> Result<(), StorageError> {
        let conn = self.lock()?;
        Self::write_streak(&conn, habit_id, streak, last_completed)
    }

    async fn delete_habit(&self, habit_id: HabitId) -> Result<bool, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let completions = tx.execute(
            "DELETE FROM habit_completions WHERE habit_id = ?1",
            params![habit_id.0],
        )?;
        let rows = tx.execute("DELETE FROM habits WHERE id = ?1", params![habit_id.0])?;
        tx.commit()?;

        tracing::debug!(
            "Deleted habit {} ({} completion records)",
            habit_id,
            completions
        );
        Ok(rows > 0)
    }

    async fn commit_toggle(
        &self,
        write: &CompletionWrite,
        streak: u32,
        last_completed: Option<NaiveDate>,
    ) -> Result<HabitCompletion, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let completion = match write {
            CompletionWrite::Insert(new) => {
                tx.execute(
                    "INSERT INTO habit_completions (habit_id, date, month, completed)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![new.habit_id.0, new.date, new.month, new.completed],
                )?;
                HabitCompletion {
                    id: CompletionId(tx.last_insert_rowid()),
                    habit_id: new.habit_id,
                    date: new.date,
                    month: new.month,
                    completed: new.completed,
                }
            }
            CompletionWrite::Update(existing) => {
                tx.execute(
                    "UPDATE habit_completions SET completed = ?1 WHERE id = ?2",
                    params![existing.completed, existing.id.0],
                )?;
                existing.clone()
            }
        };

        // Dropping the transaction on error rolls the completion back
        Self::write_streak(&tx, completion.habit_id, streak, last_completed)?;
        tx.commit()?;

        Ok(completion)
    }

    async fn find_completion(
        &self,
        habit_id: HabitId,
        date: NaiveDate,
    ) -> Result<Option<HabitCompletion>, StorageError> {
        let conn = self.lock()?;
        let completion = conn
            .query_row(
                &format!(
                    "SELECT {} FROM habit_completions WHERE habit_id = ?1 AND date = ?2",
                    COMPLETION_COLUMNS
                ),
                params![habit_id.0, date],
                Self::completion_from_row,
            )
            .optional()?;
        Ok(completion)
    }

    async fn list_completions(
        &self,
        habit_id: HabitId,
    ) -> Result<Vec<HabitCompletion>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM habit_completions WHERE habit_id = ?1 ORDER BY date",
            COMPLETION_COLUMNS
        ))?;
        let completions = stmt
            .query_map(params![habit_id.0], Self::completion_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(completions)
    }

    async fn list_completions_for_month(
        &self,
        habit_id: HabitId,
        month: Month,
    ) -> Result<Vec<HabitCompletion>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM habit_completions WHERE habit_id = ?1 AND month = ?2 ORDER BY date",
            COMPLETION_COLUMNS
        ))?;
        let completions = stmt
            .query_map(params![habit_id.0, month], Self::completion_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(completions)
    }
}

#[async_trait]
impl TaskStorage for SqliteStorage {
    async fn insert_task(&self, task: &NewTask) -> Result<Task, StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tasks (title, description, created_on, month, completed)
             VALUES (?1, ?2, ?3, ?4, FALSE)",
            params![task.title, task.description, task.created_on, task.month],
        )?;
        let id = TaskId(conn.last_insert_rowid());

        tracing::debug!("Created task: {} ({})", task.title, id);
        Ok(Task {
            id,
            title: task.title.clone(),
            description: task.description.clone(),
            created_on: task.created_on,
            month: task.month,
            completed: false,
        })
    }

    async fn get_task(&self, task_id: TaskId) -> Result<Option<Task>, StorageError> {
        let conn = self.lock()?;
        let task = conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                params![task_id.0],
                Self::task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    async fn update_task(&self, task: &Task) -> Result<(), StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE tasks SET title = ?1, description = ?2, created_on = ?3, month = ?4,
             completed = ?5 WHERE id = ?6",
            params![
                task.title,
                task.description,
                task.created_on,
                task.month,
                task.completed,
                task.id.0
            ],
        )?;

        if rows == 0 {
            return Err(StorageError::TaskNotFound {
                task_id: task.id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_task(&self, task_id: TaskId) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id.0])?;
        Ok(rows > 0)
    }

    async fn list_tasks_by_month(&self, month: Month) -> Result<Vec<Task>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE month = ?1 ORDER BY created_on, id",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map(params![month], Self::task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }
}

#[async_trait]
impl AlarmStorage for SqliteStorage {
    async fn insert_alarm(&self, alarm: &NewAlarm) -> Result<Alarm, StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO alarms (name, first_fire_ms, interval_minutes, window_from, window_to)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                alarm.name,
                alarm.first_fire_ms,
                alarm.interval_minutes,
                alarm.window.map(|w| w.from),
                alarm.window.map(|w| w.to)
            ],
        )?;

        Ok(Alarm {
            id: AlarmId(conn.last_insert_rowid()),
            name: alarm.name.clone(),
            first_fire_ms: alarm.first_fire_ms,
            interval_minutes: alarm.interval_minutes,
            window: alarm.window,
        })
    }

    async fn list_alarms(&self) -> Result<Vec<Alarm>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM alarms ORDER BY id", ALARM_COLUMNS))?;
        let alarms = stmt
            .query_map([], Self::alarm_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(alarms)
    }

    async fn find_alarm_by_name(&self, name: &str) -> Result<Option<Alarm>, StorageError> {
        let conn = self.lock()?;
        let alarm = conn
            .query_row(
                &format!("SELECT {} FROM alarms WHERE name = ?1", ALARM_COLUMNS),
                params![name],
                Self::alarm_from_row,
            )
            .optional()?;
        Ok(alarm)
    }

    async fn delete_alarm_by_name(&self, name: &str) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM alarms WHERE name = ?1", params![name])?;
        Ok(rows > 0)
    }

    async fn delete_all_alarms(&self) -> Result<usize, StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM alarms", [])?;
        Ok(rows)
    }
}

#[async_trait]
impl ChatStorage for SqliteStorage {
    async fn put_transcript(
        &self,
        problem_name: &str,
        history: &[ChatMessage],
    ) -> Result<(), StorageError> {
        let history_json = serde_json::to_string(history)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO chats (problem_name, history, saved_seq)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(saved_seq), 0) + 1 FROM chats))
             ON CONFLICT (problem_name) DO UPDATE
             SET history = excluded.history, saved_seq = excluded.saved_seq",
            params![problem_name, history_json],
        )?;
        Ok(())
    }

    async fn get_transcript(
        &self,
        problem_name: &str,
    ) -> Result<Option<Vec<ChatMessage>>, StorageError> {
        let history_json: Option<String> = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT history FROM chats WHERE problem_name = ?1",
                params![problem_name],
                |row| row.get(0),
            )
            .optional()?
        };

        match history_json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn list_problems(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT problem_name FROM chats ORDER BY saved_seq")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    async fn delete_transcript(&self, problem_name: &str) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "DELETE FROM chats WHERE problem_name = ?1",
            params![problem_name],
        )?;
        Ok(rows > 0)
    }
}
