//! Veo client configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Fast model used for plain generations.
pub const DEFAULT_FAST_MODEL: &str = "veo-3.1-fast-generate-preview";

/// Higher-fidelity model used for chained and consistency generations.
pub const DEFAULT_QUALITY_MODEL: &str = "veo-3.1-generate-preview";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the Veo client.
#[derive(Debug, Clone)]
pub struct VeoClientConfig {
    /// Base URL of the Generative Language API (including the version segment)
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Model for plain generations
    pub fast_model: String,
    /// Model for chained and consistency generations
    pub quality_model: String,
    /// Directory finished videos are downloaded into; `None` keeps remote URIs
    pub download_dir: Option<PathBuf>,
}

impl Default for VeoClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            quality_model: DEFAULT_QUALITY_MODEL.to_string(),
            download_dir: None,
        }
    }
}

impl VeoClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("VEO_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("VEO_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            fast_model: std::env::var("VEO_FAST_MODEL")
                .unwrap_or_else(|_| DEFAULT_FAST_MODEL.to_string()),
            quality_model: std::env::var("VEO_QUALITY_MODEL")
                .unwrap_or_else(|_| DEFAULT_QUALITY_MODEL.to_string()),
            download_dir: std::env::var("VEO_DOWNLOAD_DIR").ok().map(PathBuf::from),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }
}
