pub mod runner;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use runner::JobRunner;
pub use store::{MemoryStore, Persistence};

/// Kinds of background work the runner knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    GenerateDraft,
    ExportPack,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskType::GenerateDraft => write!(f, "GENERATE_DRAFT"),
            TaskType::ExportPack => write!(f, "EXPORT_PACK"),
        }
    }
}

/// Task lifecycle states. `completed`, `failed`, and `cancelled` are
/// terminal; a task always reaches one of them in bounded time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Legal transitions. Monotonic: no regression to an earlier state, no
    /// exit from a terminal state.
    pub fn can_transition(&self, to: TaskStatus) -> bool {
        matches!(
            (self, to),
            (TaskStatus::Queued, TaskStatus::Processing)
                | (TaskStatus::Queued, TaskStatus::Cancelled)
                | (TaskStatus::Queued, TaskStatus::Failed)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Queued => write!(f, "queued"),
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A trackable unit of background work. Mutated exclusively by the task
/// runner; callers poll it by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub task_type: TaskType,
    pub payload: serde_json::Value,
    pub status: TaskStatus,
    /// Present only once the task completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Present only once the task fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(task_type: TaskType, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_type,
            payload,
            status: TaskStatus::Queued,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Draft,
    Published,
}

/// The one material side effect of a completed GENERATE_DRAFT task: a new
/// course in draft status, attributed to the requesting user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub id: String,
    pub document_version_id: String,
    pub created_by: String,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
}

impl CourseRecord {
    pub fn draft(document_version_id: &str, created_by: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_version_id: document_version_id.to_string(),
            created_by: created_by.to_string(),
            status: CourseStatus::Draft,
            created_at: Utc::now(),
        }
    }
}

/// Stable key for callers that need at-most-one-course-per-document-version.
/// The runner itself does not deduplicate; persist this key under a unique
/// constraint to get that guarantee.
pub fn idempotency_key(task_type: TaskType, document_version_id: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(format!("{task_type}:{document_version_id}").as_bytes());
    format!("{:x}", hash)
}
