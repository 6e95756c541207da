//! Shared data models for Veo generation runs.
//!
//! This crate provides Serde-serializable types for:
//! - Generation jobs and their lifecycle state machine
//! - Generation modes, resolutions and aspect ratios
//! - Reference images and generated video assets
//! - Progress updates and history entries surfaced to observers
//! - Run lifecycle state

pub mod error;
pub mod history;
pub mod job;
pub mod media;
pub mod progress;
pub mod run;

// Re-export common types
pub use error::{ModelError, ModelResult};
pub use history::HistoryEntry;
pub use job::{Job, JobId, JobStatus, LaneId};
pub use media::{
    AspectRatio, AssetLocation, ReferenceImage, Resolution, VideoAsset, VideoHandle, VideoMode,
};
pub use progress::ProgressUpdate;
pub use run::{RunId, RunOutcome, RunState};
