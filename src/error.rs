use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CarecomplyError {
    #[error("invalid pattern for {kind}: {reason}")]
    InvalidPattern { kind: String, reason: String },

    #[error("invalid catalog: {reason}")]
    InvalidCatalog { reason: String },

    #[error("config parse error in {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("illegal task transition for {task_id}: {from} -> {to}")]
    IllegalTransition {
        task_id: String,
        from: String,
        to: String,
    },

    #[error("invalid task payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("task {task_id} not terminal after {waited_ms}ms")]
    TerminalTimeout { task_id: String, waited_ms: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CarecomplyError>;
