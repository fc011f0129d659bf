use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::error::{CarecomplyError, Result};

use super::{CourseRecord, Task, TaskStatus};

/// Persistence capability for the task runner, injected at construction so
/// tests and callers can supply their own backing store. Implementations
/// must serialize updates to an individual task record.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Insert a freshly created task. A failure here must propagate to the
    /// caller of `create_job`; no ghost task may remain.
    async fn insert_task(&self, task: &Task) -> Result<()>;

    /// Move a task to a new status. Rejects non-monotonic transitions.
    async fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<()>;

    /// Terminal success: status `completed` plus the result document.
    async fn complete_task(&self, task_id: &str, result: serde_json::Value) -> Result<()>;

    /// Terminal failure: status `failed` plus an error summary.
    async fn fail_task(&self, task_id: &str, error: &str) -> Result<()>;

    /// Read a task by id, for polling.
    async fn get_task(&self, task_id: &str) -> Result<Option<Task>>;

    /// Insert a course record (the GENERATE_DRAFT side effect).
    async fn insert_course(&self, course: &CourseRecord) -> Result<()>;
}

/// In-memory implementation over concurrent maps. Used by the tests and by
/// callers that do not bring a database; a SQL-backed store satisfies the
/// same trait.
#[derive(Default)]
pub struct MemoryStore {
    tasks: DashMap<String, Task>,
    courses: DashMap<String, CourseRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn course(&self, course_id: &str) -> Option<CourseRecord> {
        self.courses.get(course_id).map(|c| c.clone())
    }

    pub fn courses_created_by(&self, user_id: &str) -> Vec<CourseRecord> {
        self.courses
            .iter()
            .filter(|c| c.created_by == user_id)
            .map(|c| c.clone())
            .collect()
    }

    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    /// Apply a status transition plus a record mutation under the map's
    /// per-entry lock.
    fn transition<F>(&self, task_id: &str, to: TaskStatus, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Task),
    {
        let mut entry =
            self.tasks
                .get_mut(task_id)
                .ok_or_else(|| CarecomplyError::TaskNotFound {
                    task_id: task_id.to_string(),
                })?;
        if !entry.status.can_transition(to) {
            return Err(CarecomplyError::IllegalTransition {
                task_id: task_id.to_string(),
                from: entry.status.to_string(),
                to: to.to_string(),
            });
        }
        entry.status = to;
        mutate(&mut entry);
        entry.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn insert_task(&self, task: &Task) -> Result<()> {
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<()> {
        self.transition(task_id, status, |_| {})
    }

    async fn complete_task(&self, task_id: &str, result: serde_json::Value) -> Result<()> {
        self.transition(task_id, TaskStatus::Completed, |task| {
            task.result = Some(result);
        })
    }

    async fn fail_task(&self, task_id: &str, error: &str) -> Result<()> {
        self.transition(task_id, TaskStatus::Failed, |task| {
            task.error = Some(error.to_string());
        })
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        Ok(self.tasks.get(task_id).map(|t| t.clone()))
    }

    async fn insert_course(&self, course: &CourseRecord) -> Result<()> {
        self.courses.insert(course.id.clone(), course.clone());
        Ok(())
    }
}
