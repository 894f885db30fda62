/// Database migration management
///
/// This module handles creating and updating the SQLite database schema.
/// It ensures the database has all the required tables and indexes.

use rusqlite::Connection;

use crate::storage::StorageError;

/// Current database schema version
///
/// Increment this when you add new migrations
const CURRENT_VERSION: i32 = 1;

/// Initialize the database schema
///
/// This creates all required tables and indexes if they don't exist.
/// It also sets up the version tracking for future migrations.
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version = get_current_version(conn)?;

    if current_version > CURRENT_VERSION {
        return Err(StorageError::Migration(format!(
            "database schema v{} is newer than supported v{}",
            current_version, CURRENT_VERSION
        )));
    }

    if current_version < CURRENT_VERSION {
        run_migrations(conn, current_version)?;
        set_version(conn, CURRENT_VERSION)?;
    }

    Ok(())
}

/// Get the current database schema version
fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get::<_, i32>(0)
        })
        .unwrap_or(0); // No version row yet means a fresh database

    Ok(version)
}

/// Set the database schema version
fn set_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Run database migrations from the current version to the latest
fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), StorageError> {
    if from_version < 1 {
        migration_v1(conn)?;
    }

    Ok(())
}

/// Migration to version 1: Create initial tables
///
/// AUTOINCREMENT keeps ids monotonic, so a deleted habit's id is never
/// handed out again.
fn migration_v1(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "BEGIN;
        CREATE TABLE IF NOT EXISTS habits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            frequency TEXT NOT NULL,
            streak INTEGER NOT NULL DEFAULT 0,
            last_completed TEXT,
            created_at TEXT NOT NULL,
            month TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS habit_completions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            month TEXT NOT NULL,
            completed BOOLEAN NOT NULL,
            FOREIGN KEY (habit_id) REFERENCES habits (id)
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            created_on TEXT NOT NULL,
            month TEXT NOT NULL,
            completed BOOLEAN NOT NULL DEFAULT FALSE
        );

        CREATE TABLE IF NOT EXISTS alarms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            first_fire_ms INTEGER NOT NULL,
            interval_minutes INTEGER,
            window_from TEXT,
            window_to TEXT
        );

        CREATE TABLE IF NOT EXISTS chats (
            problem_name TEXT PRIMARY KEY,
            history TEXT NOT NULL,
            saved_seq INTEGER NOT NULL
        );
        COMMIT;",
    )?;

    create_indexes_v1(conn)?;

    tracing::info!("Applied migration v1: Created initial database schema");
    Ok(())
}

/// Create database indexes for version 1
fn create_indexes_v1(conn: &Connection) -> Result<(), StorageError> {
    // Habits created in a month
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habits_month ON habits (month)",
        [],
    )?;

    // All completions of a habit
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habit_completions_habit
         ON habit_completions (habit_id)",
        [],
    )?;

    // One record per habit and day
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_habit_completions_habit_date
         ON habit_completions (habit_id, date)",
        [],
    )?;

    // A habit's completions for one month
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habit_completions_habit_month
         ON habit_completions (habit_id, month)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tasks_month ON tasks (month)",
        [],
    )?;

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_alarms_name ON alarms (name)",
        [],
    )?;

    tracing::info!("Created database indexes for v1");
    Ok(())
}
