use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Deserialize;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::config::JobsConfig;
use crate::error::{CarecomplyError, Result};
use crate::mapping::MappingSuggester;
use crate::scanner::PhiScanner;

use super::store::Persistence;
use super::{CourseRecord, Task, TaskStatus, TaskType};

/// Shared capabilities handed to every spawned task execution.
struct TaskContext {
    store: Arc<dyn Persistence>,
    scanner: PhiScanner,
    suggester: MappingSuggester,
}

/// Drives queued tasks to a terminal state.
///
/// Execution is fire-and-forget from the caller's perspective: `create_job`
/// returns the queued task immediately and progression happens on a spawned
/// supervised tokio task that always writes `completed`, `failed`, or
/// `cancelled` before it exits. Tasks run concurrently with no ordering
/// guarantee between them; callers poll with `get_task` or
/// `wait_for_terminal`.
pub struct JobRunner {
    ctx: Arc<TaskContext>,
    config: JobsConfig,
    cancellations: Arc<DashMap<String, Arc<Notify>>>,
}

impl JobRunner {
    /// Build a runner over an injected persistence capability, with the
    /// built-in scanner and catalog for evidence-pack tasks.
    pub fn new(store: Arc<dyn Persistence>, config: JobsConfig) -> Self {
        Self::with_components(store, config, PhiScanner::new(), MappingSuggester::new())
    }

    /// Build a runner with custom analysis components.
    pub fn with_components(
        store: Arc<dyn Persistence>,
        config: JobsConfig,
        scanner: PhiScanner,
        suggester: MappingSuggester,
    ) -> Self {
        Self {
            ctx: Arc::new(TaskContext {
                store,
                scanner,
                suggester,
            }),
            config,
            cancellations: Arc::new(DashMap::new()),
        }
    }

    /// Create a task and begin executing it in the background.
    ///
    /// The task is returned in `queued` state. An insert failure propagates
    /// to the caller and leaves no task behind; nothing is spawned in that
    /// case.
    pub async fn create_job(&self, task_type: TaskType, payload: serde_json::Value) -> Result<Task> {
        let task = Task::new(task_type, payload);
        self.ctx.store.insert_task(&task).await?;

        let cancel = Arc::new(Notify::new());
        self.cancellations.insert(task.id.clone(), cancel.clone());

        let ctx = self.ctx.clone();
        let cancellations = self.cancellations.clone();
        let pickup_delay = Duration::from_millis(self.config.pickup_delay_ms);
        let spawned = task.clone();
        tokio::spawn(async move {
            let task_id = spawned.id.clone();
            execute(ctx, spawned, cancel, pickup_delay).await;
            cancellations.remove(&task_id);
        });

        info!(task_id = %task.id, task_type = %task.task_type, "task queued");
        Ok(task)
    }

    /// Request cancellation. Honored at the suspension point before the
    /// task reaches `processing`; a task whose action already started runs
    /// to its normal terminal state.
    pub fn cancel(&self, task_id: &str) {
        if let Some(cancel) = self.cancellations.get(task_id) {
            cancel.notify_one();
        }
    }

    /// Read the current task record, for polling.
    pub async fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.ctx.store.get_task(task_id).await
    }

    /// Poll the store until the task reaches a terminal state.
    pub async fn wait_for_terminal(&self, task_id: &str, timeout: Duration) -> Result<Task> {
        let start = Instant::now();
        loop {
            let task = self.ctx.store.get_task(task_id).await?.ok_or_else(|| {
                CarecomplyError::TaskNotFound {
                    task_id: task_id.to_string(),
                }
            })?;
            if task.status.is_terminal() {
                return Ok(task);
            }
            if start.elapsed() >= timeout {
                return Err(CarecomplyError::TerminalTimeout {
                    task_id: task_id.to_string(),
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

/// Run one task to a terminal state. Every exit path writes `completed`,
/// `failed`, or `cancelled`; an action error never leaves the task dangling
/// in `processing`.
async fn execute(ctx: Arc<TaskContext>, task: Task, cancel: Arc<Notify>, pickup_delay: Duration) {
    tokio::select! {
        _ = tokio::time::sleep(pickup_delay) => {}
        _ = cancel.notified() => {
            match ctx.store.update_task_status(&task.id, TaskStatus::Cancelled).await {
                Ok(()) => info!(task_id = %task.id, "task cancelled before pickup"),
                Err(e) => warn!(task_id = %task.id, error = %e, "failed to record cancellation"),
            }
            return;
        }
    }

    if let Err(e) = ctx
        .store
        .update_task_status(&task.id, TaskStatus::Processing)
        .await
    {
        warn!(task_id = %task.id, error = %e, "failed to move task to processing");
        fail(&*ctx.store, &task.id, &format!("could not start processing: {e}")).await;
        return;
    }
    info!(task_id = %task.id, "task processing");

    match run_action(&ctx, &task).await {
        Ok(result) => match ctx.store.complete_task(&task.id, result).await {
            Ok(()) => info!(task_id = %task.id, "task completed"),
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "failed to record completion");
                fail(&*ctx.store, &task.id, &format!("could not record completion: {e}")).await;
            }
        },
        Err(e) => fail(&*ctx.store, &task.id, &e.to_string()).await,
    }
}

async fn fail(store: &dyn Persistence, task_id: &str, summary: &str) {
    match store.fail_task(task_id, summary).await {
        Ok(()) => info!(task_id, error = summary, "task failed"),
        Err(e) => warn!(task_id, error = %e, "failed to record task failure"),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateDraftPayload {
    document_version_id: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportPackPayload {
    document_text: String,
}

/// Task-type dispatch. GENERATE_DRAFT performs the single material side
/// effect: exactly one draft course attributed to the requesting user.
/// EXPORT_PACK is pure: it assembles the evidence summary for a document.
async fn run_action(ctx: &TaskContext, task: &Task) -> Result<serde_json::Value> {
    match task.task_type {
        TaskType::GenerateDraft => {
            let payload: GenerateDraftPayload = serde_json::from_value(task.payload.clone())
                .map_err(|e| CarecomplyError::InvalidPayload {
                    reason: e.to_string(),
                })?;
            let course = CourseRecord::draft(&payload.document_version_id, &payload.user_id);
            ctx.store.insert_course(&course).await?;
            Ok(serde_json::json!({ "courseId": course.id }))
        }
        TaskType::ExportPack => {
            let payload: ExportPackPayload = serde_json::from_value(task.payload.clone())
                .map_err(|e| CarecomplyError::InvalidPayload {
                    reason: e.to_string(),
                })?;
            let scan = ctx.scanner.scan(&payload.document_text);
            let suggestions = ctx.suggester.suggest(&payload.document_text);
            // suggest() always returns at least one entry.
            Ok(serde_json::json!({
                "hasPhi": scan.has_phi,
                "findingCount": scan.findings.len(),
                "suggestionCount": suggestions.len(),
                "topStandardId": suggestions[0].standard_id,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::MemoryStore;
    use async_trait::async_trait;

    fn fast_config() -> JobsConfig {
        JobsConfig { pickup_delay_ms: 10 }
    }

    /// Store double whose course insert always fails, to exercise the
    /// failure path of the GENERATE_DRAFT action.
    struct BrokenCourseStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl Persistence for BrokenCourseStore {
        async fn insert_task(&self, task: &Task) -> Result<()> {
            self.inner.insert_task(task).await
        }
        async fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<()> {
            self.inner.update_task_status(task_id, status).await
        }
        async fn complete_task(&self, task_id: &str, result: serde_json::Value) -> Result<()> {
            self.inner.complete_task(task_id, result).await
        }
        async fn fail_task(&self, task_id: &str, error: &str) -> Result<()> {
            self.inner.fail_task(task_id, error).await
        }
        async fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
            self.inner.get_task(task_id).await
        }
        async fn insert_course(&self, _course: &CourseRecord) -> Result<()> {
            Err(CarecomplyError::Storage {
                reason: "course table unavailable".into(),
            })
        }
    }

    /// Store double whose task insert fails, to exercise the no-ghost-task
    /// guarantee of `create_job`.
    struct RejectingStore;

    #[async_trait]
    impl Persistence for RejectingStore {
        async fn insert_task(&self, _task: &Task) -> Result<()> {
            Err(CarecomplyError::Storage {
                reason: "insert rejected".into(),
            })
        }
        async fn update_task_status(&self, _task_id: &str, _status: TaskStatus) -> Result<()> {
            unreachable!("no task was ever inserted")
        }
        async fn complete_task(&self, _task_id: &str, _result: serde_json::Value) -> Result<()> {
            unreachable!("no task was ever inserted")
        }
        async fn fail_task(&self, _task_id: &str, _error: &str) -> Result<()> {
            unreachable!("no task was ever inserted")
        }
        async fn get_task(&self, _task_id: &str) -> Result<Option<Task>> {
            Ok(None)
        }
        async fn insert_course(&self, _course: &CourseRecord) -> Result<()> {
            unreachable!("no task was ever inserted")
        }
    }

    #[tokio::test]
    async fn test_create_job_returns_queued_immediately() {
        let store = Arc::new(MemoryStore::new());
        let runner = JobRunner::new(store, fast_config());

        let task = runner
            .create_job(
                TaskType::GenerateDraft,
                serde_json::json!({"documentVersionId": "dv-1", "userId": "user-1"}),
            )
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Queued);
    }

    #[tokio::test]
    async fn test_action_error_reaches_failed_not_stuck() {
        let store = Arc::new(BrokenCourseStore {
            inner: MemoryStore::new(),
        });
        let runner = JobRunner::new(store, fast_config());

        let task = runner
            .create_job(
                TaskType::GenerateDraft,
                serde_json::json!({"documentVersionId": "dv-1", "userId": "user-1"}),
            )
            .await
            .unwrap();

        let done = runner
            .wait_for_terminal(&task.id, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Failed);
        assert!(done.error.unwrap().contains("course table unavailable"));
    }

    #[tokio::test]
    async fn test_insert_failure_propagates_no_ghost_task() {
        let runner = JobRunner::new(Arc::new(RejectingStore), fast_config());
        let err = runner
            .create_job(TaskType::GenerateDraft, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CarecomplyError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_malformed_payload_fails_terminally() {
        let store = Arc::new(MemoryStore::new());
        let runner = JobRunner::new(store.clone(), fast_config());

        let task = runner
            .create_job(TaskType::GenerateDraft, serde_json::json!({"wrong": true}))
            .await
            .unwrap();

        let done = runner
            .wait_for_terminal(&task.id, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Failed);
        assert_eq!(store.course_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_before_pickup_skips_side_effect() {
        let store = Arc::new(MemoryStore::new());
        let runner = JobRunner::new(
            store.clone(),
            JobsConfig {
                pickup_delay_ms: 10_000,
            },
        );

        let task = runner
            .create_job(
                TaskType::GenerateDraft,
                serde_json::json!({"documentVersionId": "dv-1", "userId": "user-1"}),
            )
            .await
            .unwrap();
        runner.cancel(&task.id);

        let done = runner
            .wait_for_terminal(&task.id, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Cancelled);
        assert_eq!(store.course_count(), 0);
    }
}
