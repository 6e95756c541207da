//! Provider boundary consumed by the orchestrator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use veo_models::{AspectRatio, AssetLocation, Job, ReferenceImage, Resolution, VideoHandle, VideoMode};

use crate::error::{ProviderError, ProviderResult};

/// Everything the provider needs to start one generation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub mode: VideoMode,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub reference_assets: Vec<ReferenceImage>,
    pub chain_input: Option<VideoHandle>,
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
}

impl GenerationRequest {
    /// Build the request for a job.
    pub fn for_job(job: &Job, resolution: Resolution, aspect_ratio: AspectRatio) -> Self {
        Self {
            mode: job.mode,
            prompt: job.prompt.clone(),
            negative_prompt: job.negative_prompt.clone(),
            reference_assets: job.reference_assets.clone(),
            chain_input: job.chain_input.clone(),
            resolution,
            aspect_ratio,
        }
    }

    pub fn is_chained(&self) -> bool {
        self.chain_input.is_some()
    }

    /// Chained and consistency generations need the higher-fidelity model.
    pub fn needs_quality_model(&self) -> bool {
        self.is_chained() || self.mode == VideoMode::Consistency
    }

    /// Check the request shape before anything is sent.
    ///
    /// A chained request is conditioned on the previous video and carries no
    /// reference images, so the per-mode image counts apply only to
    /// unchained requests.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(ProviderError::invalid_input("prompt is empty"));
        }

        if self.reference_assets.iter().any(ReferenceImage::is_empty) {
            return Err(ProviderError::invalid_input("reference image has no data"));
        }

        if self.is_chained() {
            if !self.reference_assets.is_empty() {
                return Err(ProviderError::invalid_input(
                    "chained request cannot carry reference images",
                ));
            }
            return Ok(());
        }

        if let Some(required) = self.mode.required_references() {
            let supplied = self.reference_assets.len();
            if supplied != required {
                return Err(ProviderError::invalid_input(format!(
                    "{} requires exactly {} reference image(s), got {}",
                    self.mode, required, supplied
                )));
            }
        }

        if self.mode == VideoMode::TextToVideo && !self.reference_assets.is_empty() {
            return Err(ProviderError::invalid_input(
                "text_to_video does not accept reference images",
            ));
        }

        Ok(())
    }

    /// Prompt text actually sent, with any negative prompt folded in.
    pub fn effective_prompt(&self) -> String {
        match (&self.negative_prompt, self.mode, self.is_chained()) {
            (Some(negative), VideoMode::TextToVideo, false) => {
                format!("{} [Negative: {}]", self.prompt, negative)
            }
            _ => self.prompt.clone(),
        }
    }

    /// Chained generations are always rendered at 720p.
    pub fn effective_resolution(&self) -> Resolution {
        if self.is_chained() {
            Resolution::R720p
        } else {
            self.resolution
        }
    }
}

/// Opaque handle to a long-running provider operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderHandle {
    pub operation_name: String,
}

impl ProviderHandle {
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
        }
    }
}

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Still generating
    Pending,
    /// Finished with a video
    Done(VideoHandle),
}

impl PollStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, PollStatus::Done(_))
    }
}

/// A video generation backend.
///
/// `poll` must be safe to call repeatedly and must not sleep; the caller
/// owns the poll cadence. `fetch_asset` never fails: when the video cannot
/// be materialized locally it returns the remote location instead.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Validate and start a generation.
    async fn submit(&self, request: &GenerationRequest) -> ProviderResult<ProviderHandle>;

    /// Check whether a generation has finished.
    async fn poll(&self, handle: &ProviderHandle) -> ProviderResult<PollStatus>;

    /// Best-effort download of a finished video.
    async fn fetch_asset(&self, video: &VideoHandle) -> AssetLocation;
}
