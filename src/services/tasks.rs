/// Task calendar service
///
/// Reads and writes of existing tasks swallow storage failures: they are
/// logged and reported as `false` or an empty list.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::{Month, NewTask, Task, TaskId};
use crate::storage::TaskStorage;
use crate::LifeNodeError;

pub struct TaskStore<S> {
    storage: Arc<S>,
}

impl<S: TaskStorage> TaskStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// File a new task under `day`
    pub async fn create_task(
        &self,
        title: &str,
        description: Option<String>,
        day: NaiveDate,
    ) -> Result<Task, LifeNodeError> {
        let new_task = NewTask::new(title, description, day)?;
        Ok(self.storage.insert_task(&new_task).await?)
    }

    pub async fn get_task_by_id(&self, task_id: TaskId) -> Result<Option<Task>, LifeNodeError> {
        Ok(self.storage.get_task(task_id).await?)
    }

    pub async fn delete_task(&self, task_id: TaskId) -> bool {
        match self.storage.delete_task(task_id).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Error deleting task {}: {}", task_id, e);
                false
            }
        }
    }

    pub async fn get_tasks_for_month(&self, month: Month) -> Vec<Task> {
        match self.storage.list_tasks_by_month(month).await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!("Error fetching tasks for {}: {}", month, e);
                Vec::new()
            }
        }
    }

    /// Store `task` filed under `day`
    pub async fn update_task(&self, mut task: Task, day: NaiveDate) -> bool {
        task.move_to(day);

        if let Err(e) = task.validate() {
            tracing::warn!("Rejected update of task {}: {}", task.id, e);
            return false;
        }

        match self.storage.update_task(&task).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error updating task {}: {}", task.id, e);
                false
            }
        }
    }
}
