/// Services built on top of the storage traits
///
/// Each service owns the rules for one area of the app (habit toggling and
/// streak caching, the task calendar, reminders, chat transcripts) and takes
/// its storage as an injected handle.

pub mod chat;
pub mod habits;
pub mod reminders;
pub mod tasks;

pub use chat::{ChatError, ChatModel, GenerateRequest, TranscriptStore, MAX_TRANSCRIPTS};
pub use habits::{HabitStore, ToggleOutcome};
pub use reminders::{AlarmScheduler, ReminderService, SchedulerError};
pub use tasks::TaskStore;
