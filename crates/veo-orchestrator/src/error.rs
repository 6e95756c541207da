//! Orchestrator error types.
//!
//! Job-level failures are recorded on the job itself; these errors only
//! cover problems detected before a run starts or while waiting on it,
//! plus history persistence.

use thiserror::Error;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Script produced no prompts")]
    EmptyInput,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Run task failed: {0}")]
    TaskFailed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrchestratorError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn is_empty_input(&self) -> bool {
        matches!(self, OrchestratorError::EmptyInput)
    }
}
