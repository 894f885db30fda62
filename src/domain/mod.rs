/// Domain module containing core business logic and data types
///
/// This module defines the core entities (Habit, HabitCompletion, Task, Alarm,
/// chat transcripts) and the streak calculations that run over them. Nothing
/// in here touches storage.

pub mod habit;
pub mod completion;
pub mod period;
pub mod streak;
pub mod task;
pub mod alarm;
pub mod chat;
pub mod types;

// Re-export public types for easy access
pub use habit::*;
pub use completion::*;
pub use period::*;
pub use streak::*;
pub use task::*;
pub use alarm::*;
pub use chat::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid habit name: {0}")]
    InvalidHabitName(String),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid month: {0}")]
    InvalidMonth(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },
}
