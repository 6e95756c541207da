//! Generation job entity and its lifecycle state machine.
//!
//! A job moves `Queued -> Submitting -> Polling -> {Succeeded | Failed}`.
//! Validation and provider failures can also fail a job straight from
//! `Submitting`. Terminal jobs never change again.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};
use crate::media::{ReferenceImage, VideoAsset, VideoHandle, VideoMode};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-based lane number within a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct LaneId(pub u32);

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for its turn in the lane
    #[default]
    Queued,
    /// Request is being validated and sent
    Submitting,
    /// Provider accepted the request; waiting for it to finish
    Polling,
    /// Video generated
    Succeeded,
    /// Generation failed
    Failed,
}

impl JobStatus {
    /// Lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Submitting => "submitting",
            JobStatus::Polling => "polling",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Check if a provider call may be in flight in this state.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Submitting | JobStatus::Polling)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Submitting)
                | (JobStatus::Submitting, JobStatus::Polling)
                | (JobStatus::Submitting, JobStatus::Failed)
                | (JobStatus::Polling, JobStatus::Polling)
                | (JobStatus::Polling, JobStatus::Succeeded)
                | (JobStatus::Polling, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of generation work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Lane that owns this job
    pub lane_id: LaneId,

    /// Position of this job within its lane (0-based)
    pub sequence: usize,

    /// Generation mode, fixed at creation
    pub mode: VideoMode,

    /// Prompt text
    pub prompt: String,

    /// Text the provider should avoid (text-to-video only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    /// Conditioning images
    #[serde(default)]
    pub reference_assets: Vec<ReferenceImage>,

    /// Previous video in the chain, if this job continues one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_input: Option<VideoHandle>,

    /// Lifecycle status
    #[serde(default)]
    pub status: JobStatus,

    /// Heuristic progress (0-100)
    #[serde(default)]
    pub progress_percent: u8,

    /// Latest human-readable status text
    #[serde(default)]
    pub status_message: String,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Generated video (only when succeeded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_asset: Option<VideoAsset>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new queued job.
    pub fn new(
        lane_id: LaneId,
        sequence: usize,
        mode: VideoMode,
        prompt: impl Into<String>,
        reference_assets: Vec<ReferenceImage>,
        chain_input: Option<VideoHandle>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            lane_id,
            sequence,
            mode,
            prompt: prompt.into(),
            negative_prompt: None,
            reference_assets,
            chain_input,
            status: JobStatus::Queued,
            progress_percent: 0,
            status_message: String::new(),
            error_message: None,
            result_asset: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a negative prompt; blank text is dropped.
    pub fn with_negative_prompt(mut self, negative_prompt: Option<String>) -> Self {
        self.negative_prompt = negative_prompt.filter(|s| !s.trim().is_empty());
        self
    }

    /// Whether the job reached `Succeeded` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn transition(&mut self, next: JobStatus) -> ModelResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(ModelError::invalid_transition(self.status, next));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// `Queued -> Submitting`. Only one submission per job is ever allowed.
    pub fn begin_submit(&mut self, message: impl Into<String>, initial_percent: u8) -> ModelResult<()> {
        self.transition(JobStatus::Submitting)?;
        self.status_message = message.into();
        self.progress_percent = initial_percent.min(100);
        Ok(())
    }

    /// `Submitting -> Polling`.
    pub fn begin_polling(&mut self, message: impl Into<String>, step: u8, cap: u8) -> ModelResult<()> {
        if self.status != JobStatus::Submitting {
            return Err(ModelError::invalid_transition(self.status, JobStatus::Polling));
        }
        self.transition(JobStatus::Polling)?;
        self.bump_progress(message, step, cap);
        Ok(())
    }

    /// Record a "still working" tick while polling.
    ///
    /// Progress is a heuristic: the provider only reports done or not done,
    /// so each tick adds `step` up to `cap` and never moves backwards.
    pub fn record_tick(&mut self, message: impl Into<String>, step: u8, cap: u8) -> ModelResult<()> {
        self.transition(JobStatus::Polling)?;
        self.bump_progress(message, step, cap);
        Ok(())
    }

    fn bump_progress(&mut self, message: impl Into<String>, step: u8, cap: u8) {
        let next = self.progress_percent.saturating_add(step).min(cap);
        self.progress_percent = self.progress_percent.max(next);
        self.status_message = message.into();
    }

    /// `Polling -> Succeeded`.
    pub fn succeed(&mut self, asset: VideoAsset, message: impl Into<String>) -> ModelResult<()> {
        self.transition(JobStatus::Succeeded)?;
        self.result_asset = Some(asset);
        self.progress_percent = 100;
        self.status_message = message.into();
        self.error_message = None;
        Ok(())
    }

    /// `Submitting | Polling -> Failed`.
    pub fn fail(&mut self, error: impl Into<String>, message: impl Into<String>) -> ModelResult<()> {
        self.transition(JobStatus::Failed)?;
        self.progress_percent = 0;
        self.status_message = message.into();
        self.error_message = Some(error.into());
        Ok(())
    }

    /// Handle to chain into the next job, present only on success.
    pub fn chain_output(&self) -> Option<VideoHandle> {
        self.result_asset.as_ref().map(|asset| asset.handle.clone())
    }
}
