//! Model error types.

use thiserror::Error;

use crate::job::JobStatus;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
}

impl ModelError {
    pub fn invalid_transition(from: JobStatus, to: JobStatus) -> Self {
        Self::InvalidTransition { from, to }
    }

    pub fn invalid_data_url(msg: impl Into<String>) -> Self {
        Self::InvalidDataUrl(msg.into())
    }
}
