/// Reminder service with a recording scheduler
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveTime;
use lifenode::*;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Schedule(String, i64, Option<u32>),
    Cancel(String),
    CancelAll,
}

#[derive(Default)]
struct RecordingScheduler {
    calls: Mutex<Vec<Call>>,
    reject: bool,
}

impl RecordingScheduler {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlarmScheduler for RecordingScheduler {
    async fn schedule_recurring(
        &self,
        name: &str,
        first_fire_ms: i64,
        period_minutes: Option<u32>,
    ) -> Result<(), SchedulerError> {
        if self.reject {
            return Err(SchedulerError::Rejected {
                name: name.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.calls.lock().unwrap().push(Call::Schedule(
            name.to_string(),
            first_fire_ms,
            period_minutes,
        ));
        Ok(())
    }

    async fn cancel(&self, name: &str) -> Result<(), SchedulerError> {
        self.calls.lock().unwrap().push(Call::Cancel(name.to_string()));
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), SchedulerError> {
        self.calls.lock().unwrap().push(Call::CancelAll);
        Ok(())
    }
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn app() -> LifeNode {
    LifeNode::in_memory(Clock::System).unwrap()
}

#[tokio::test]
async fn test_add_alarm_persists_and_schedules() {
    let app = app();
    let reminders = app.reminders(RecordingScheduler::default());

    let alarm = reminders
        .add_alarm(NewAlarm::new("water", 1_700_000_000_000, Some(30), None).unwrap())
        .await
        .unwrap();

    assert_eq!(alarm.name, "water");
    assert_eq!(reminders.get_alarms().await.unwrap().len(), 1);
    assert_eq!(
        reminders.scheduler().calls(),
        vec![Call::Schedule("water".to_string(), 1_700_000_000_000, Some(30))]
    );
}

#[tokio::test]
async fn test_rejected_schedule_rolls_back_record() {
    let app = app();
    let reminders = app.reminders(RecordingScheduler {
        reject: true,
        ..Default::default()
    });

    let result = reminders
        .add_alarm(NewAlarm::new("water", 0, None, None).unwrap())
        .await;

    assert!(matches!(result, Err(LifeNodeError::Scheduler(_))));
    assert!(reminders.get_alarms().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_alarm_names_are_unique() {
    let app = app();
    let reminders = app.reminders(RecordingScheduler::default());

    reminders
        .add_alarm(NewAlarm::new("stretch", 0, Some(60), None).unwrap())
        .await
        .unwrap();
    let duplicate = reminders
        .add_alarm(NewAlarm::new("stretch", 5, Some(60), None).unwrap())
        .await;

    assert!(matches!(duplicate, Err(LifeNodeError::Database(_))));
    assert_eq!(reminders.scheduler().calls().len(), 1);
}

#[tokio::test]
async fn test_remove_alarm_always_cancels_timer() {
    let app = app();
    let reminders = app.reminders(RecordingScheduler::default());
    reminders
        .add_alarm(NewAlarm::new("water", 0, Some(30), None).unwrap())
        .await
        .unwrap();

    reminders.remove_alarm("water").await.unwrap();
    reminders.remove_alarm("ghost").await.unwrap();

    assert!(reminders.get_alarms().await.unwrap().is_empty());
    let calls = reminders.scheduler().calls();
    assert_eq!(calls[1], Call::Cancel("water".to_string()));
    assert_eq!(calls[2], Call::Cancel("ghost".to_string()));
}

#[tokio::test]
async fn test_clear_all_alarms() {
    let app = app();
    let reminders = app.reminders(RecordingScheduler::default());
    for name in ["a", "b", "c"] {
        reminders
            .add_alarm(NewAlarm::new(name, 0, None, None).unwrap())
            .await
            .unwrap();
    }

    reminders.clear_all_alarms().await.unwrap();

    assert!(reminders.get_alarms().await.unwrap().is_empty());
    assert_eq!(reminders.scheduler().calls().last(), Some(&Call::CancelAll));
}

#[tokio::test]
async fn test_fired_alarm_respects_window() {
    let app = app();
    let reminders = app.reminders(RecordingScheduler::default());
    let night = TimeWindow::parse("22:00", "06:00").unwrap();
    reminders
        .add_alarm(NewAlarm::new("sleep", 0, Some(60), Some(night)).unwrap())
        .await
        .unwrap();
    reminders
        .add_alarm(NewAlarm::new("water", 0, Some(30), None).unwrap())
        .await
        .unwrap();

    let notification = reminders.handle_fired("sleep", at(23, 15)).await.unwrap();
    assert_eq!(
        notification,
        Some(Notification {
            title: "Alarm Reminder".to_string(),
            message: "Alarm: sleep is ringing!".to_string(),
        })
    );
    assert!(reminders.handle_fired("sleep", at(5, 59)).await.unwrap().is_some());
    // A timer that fires a few seconds late still lands in the last minute
    let late = NaiveTime::from_hms_opt(6, 0, 30).unwrap();
    assert!(reminders.handle_fired("sleep", late).await.unwrap().is_some());
    assert!(reminders.handle_fired("sleep", at(6, 1)).await.unwrap().is_none());
    assert!(reminders.handle_fired("sleep", at(12, 0)).await.unwrap().is_none());

    assert!(reminders.handle_fired("water", at(12, 0)).await.unwrap().is_some());
    assert!(reminders.handle_fired("unknown", at(12, 0)).await.unwrap().is_none());
}
