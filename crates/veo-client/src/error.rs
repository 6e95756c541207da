//! Provider error types.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Message fragments the provider uses when a key is rejected.
const AUTH_MESSAGE_PATTERNS: [&str; 2] = ["API key not valid", "Requested entity was not found"];

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Classify a provider-reported message, promoting key rejections to `Auth`.
    pub fn from_provider_message(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if AUTH_MESSAGE_PATTERNS.iter().any(|p| msg.contains(p)) {
            Self::Auth(msg)
        } else {
            Self::Provider(msg)
        }
    }

    /// Credentials were missing or rejected; the caller needs a new key.
    pub fn is_auth(&self) -> bool {
        matches!(self, ProviderError::Auth(_))
    }

    /// The request was malformed and was never sent.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ProviderError::InvalidInput(_))
    }
}
