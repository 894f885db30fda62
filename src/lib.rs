/// Public library interface for LifeNode
///
/// This module exports the habit, task, reminder and chat services together
/// with the `LifeNode` handle that wires them to one SQLite database.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

// Internal modules
mod analytics;
mod domain;
mod services;
mod storage;

// Re-export public modules and types
pub use analytics::{AnalyticsEngine, DaySummary};
pub use domain::*;
pub use services::{
    AlarmScheduler, ChatError, ChatModel, GenerateRequest, HabitStore, ReminderService,
    SchedulerError, TaskStore, ToggleOutcome, TranscriptStore, MAX_TRANSCRIPTS,
};
pub use storage::{
    AlarmStorage, ChatStorage, HabitStorage, MemoryStorage, SqliteStorage, StorageError,
    TaskStorage,
};

/// Errors that can occur in LifeNode operations
#[derive(Error, Debug)]
pub enum LifeNodeError {
    #[error("Database error: {0}")]
    Database(#[from] storage::StorageError),

    #[error("Domain validation error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("Chat error: {0}")]
    Chat(#[from] services::ChatError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] services::SchedulerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// All LifeNode services sharing one SQLite database
pub struct LifeNode {
    storage: Arc<SqliteStorage>,
    habits: HabitStore<SqliteStorage>,
    tasks: TaskStore<SqliteStorage>,
    transcripts: TranscriptStore<SqliteStorage>,
    analytics: AnalyticsEngine,
}

impl LifeNode {
    /// Open (or create) the database at `db_path`
    ///
    /// This will initialize the SQLite schema if it doesn't already exist.
    pub fn open(db_path: PathBuf) -> Result<Self, LifeNodeError> {
        Self::open_with_clock(db_path, Clock::System)
    }

    /// Like `open`, with streaks measured against `clock`
    pub fn open_with_clock(db_path: PathBuf, clock: Clock) -> Result<Self, LifeNodeError> {
        tracing::info!("Initializing LifeNode with database: {:?}", db_path);
        let storage = SqliteStorage::new(db_path)?;
        Ok(Self::with_storage(Arc::new(storage), clock))
    }

    /// Services over a fresh in-memory database
    pub fn in_memory(clock: Clock) -> Result<Self, LifeNodeError> {
        let storage = SqliteStorage::in_memory()?;
        Ok(Self::with_storage(Arc::new(storage), clock))
    }

    fn with_storage(storage: Arc<SqliteStorage>, clock: Clock) -> Self {
        Self {
            habits: HabitStore::with_clock(Arc::clone(&storage), clock),
            tasks: TaskStore::new(Arc::clone(&storage)),
            transcripts: TranscriptStore::new(Arc::clone(&storage)),
            analytics: AnalyticsEngine::new(),
            storage,
        }
    }

    pub fn habits(&self) -> &HabitStore<SqliteStorage> {
        &self.habits
    }

    pub fn tasks(&self) -> &TaskStore<SqliteStorage> {
        &self.tasks
    }

    pub fn transcripts(&self) -> &TranscriptStore<SqliteStorage> {
        &self.transcripts
    }

    pub fn analytics(&self) -> &AnalyticsEngine {
        &self.analytics
    }

    /// Reminder service driving `scheduler`
    pub fn reminders<C: AlarmScheduler>(&self, scheduler: C) -> ReminderService<SqliteStorage, C> {
        ReminderService::new(Arc::clone(&self.storage), scheduler)
    }

    /// Get a reference to the storage layer (useful for testing)
    pub fn storage(&self) -> &Arc<SqliteStorage> {
        &self.storage
    }
}
