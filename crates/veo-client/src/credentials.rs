//! API key resolution.

use crate::error::{ProviderError, ProviderResult};

/// Supplies the API key used for provider calls.
///
/// A caller-provided override wins over the environment-level default.
/// Blank values count as absent.
#[derive(Clone, Default)]
pub struct CredentialSource {
    override_key: Option<String>,
    default_key: Option<String>,
}

impl CredentialSource {
    pub fn new(override_key: Option<String>, default_key: Option<String>) -> Self {
        Self {
            override_key: non_blank(override_key),
            default_key: non_blank(default_key),
        }
    }

    /// Create from environment variables.
    ///
    /// `VEO_OVERRIDE_API_KEY` is the override; `VEO_API_KEY`, falling back to
    /// `GEMINI_API_KEY`, is the default.
    pub fn from_env() -> Self {
        let default_key = std::env::var("VEO_API_KEY")
            .ok()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok());
        Self::new(std::env::var("VEO_OVERRIDE_API_KEY").ok(), default_key)
    }

    /// Replace the override key (e.g. after the user entered a new one).
    pub fn with_override(mut self, key: impl Into<String>) -> Self {
        self.override_key = non_blank(Some(key.into()));
        self
    }

    /// Resolve the key to use, failing with `Auth` if none is configured.
    pub fn resolve(&self) -> ProviderResult<&str> {
        self.override_key
            .as_deref()
            .or(self.default_key.as_deref())
            .ok_or_else(|| ProviderError::auth("API key is not configured"))
    }

    pub fn has_override(&self) -> bool {
        self.override_key.is_some()
    }
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSource")
            .field("override_key", &self.override_key.as_ref().map(|_| "***"))
            .field("default_key", &self.default_key.as_ref().map(|_| "***"))
            .finish()
    }
}

fn non_blank(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}
