/// Reminder service
///
/// Alarms are persisted through `AlarmStorage` and mirrored into an external
/// timer service. The timer service only knows alarm names; when one fires,
/// `handle_fired` looks the alarm up again to decide whether to notify.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveTime;
use thiserror::Error;

use crate::domain::{Alarm, NewAlarm, Notification};
use crate::storage::AlarmStorage;
use crate::LifeNodeError;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Scheduler rejected alarm '{name}': {reason}")]
    Rejected { name: String, reason: String },

    #[error("Scheduler unavailable: {0}")]
    Unavailable(String),
}

/// External timer service
#[async_trait]
pub trait AlarmScheduler: Send + Sync {
    /// Start a timer called `name`; `period_minutes = None` fires once
    async fn schedule_recurring(
        &self,
        name: &str,
        first_fire_ms: i64,
        period_minutes: Option<u32>,
    ) -> Result<(), SchedulerError>;

    async fn cancel(&self, name: &str) -> Result<(), SchedulerError>;

    async fn cancel_all(&self) -> Result<(), SchedulerError>;
}

pub struct ReminderService<S, C> {
    storage: Arc<S>,
    scheduler: C,
}

impl<S: AlarmStorage, C: AlarmScheduler> ReminderService<S, C> {
    pub fn new(storage: Arc<S>, scheduler: C) -> Self {
        Self { storage, scheduler }
    }

    pub fn scheduler(&self) -> &C {
        &self.scheduler
    }

    pub async fn get_alarms(&self) -> Result<Vec<Alarm>, LifeNodeError> {
        Ok(self.storage.list_alarms().await?)
    }

    /// Persist the alarm, then start its timer
    ///
    /// If the scheduler refuses the timer the record is removed again.
    pub async fn add_alarm(&self, new_alarm: NewAlarm) -> Result<Alarm, LifeNodeError> {
        let alarm = self.storage.insert_alarm(&new_alarm).await?;

        if let Err(e) = self
            .scheduler
            .schedule_recurring(&alarm.name, alarm.first_fire_ms, alarm.interval_minutes)
            .await
        {
            tracing::warn!("Could not schedule alarm '{}': {}", alarm.name, e);
            self.storage.delete_alarm_by_name(&alarm.name).await?;
            return Err(e.into());
        }

        tracing::debug!("Scheduled alarm '{}' ({})", alarm.name, alarm.id);
        Ok(alarm)
    }

    /// Delete the alarm record if there is one and cancel its timer either way
    pub async fn remove_alarm(&self, name: &str) -> Result<(), LifeNodeError> {
        if !self.storage.delete_alarm_by_name(name).await? {
            tracing::debug!("No stored alarm named '{}'", name);
        }
        self.scheduler.cancel(name).await?;
        Ok(())
    }

    pub async fn clear_all_alarms(&self) -> Result<(), LifeNodeError> {
        let removed = self.storage.delete_all_alarms().await?;
        self.scheduler.cancel_all().await?;

        tracing::debug!("Cleared {} alarms", removed);
        Ok(())
    }

    /// Notification for a timer that just fired, if one should be shown
    pub async fn handle_fired(
        &self,
        name: &str,
        now: NaiveTime,
    ) -> Result<Option<Notification>, LifeNodeError> {
        let Some(alarm) = self.storage.find_alarm_by_name(name).await? else {
            tracing::warn!("Timer '{}' fired without a stored alarm", name);
            return Ok(None);
        };

        if !alarm.is_active_at(now) {
            tracing::debug!("Alarm '{}' fired outside its window at {}", name, now);
            return Ok(None);
        }

        Ok(Some(Notification::for_alarm(&alarm.name)))
    }
}
