//! Generation history entries.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::{Job, JobId, JobStatus};
use crate::media::VideoMode;

/// Record of a successfully generated video, handed to the caller's
/// history store exactly once per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: JobId,
    pub url: String,
    pub prompt: String,
    pub timestamp: DateTime<Utc>,
    pub mode: VideoMode,
    pub progress: u8,
    pub status: String,
}

impl HistoryEntry {
    /// Build an entry from a succeeded job. Returns `None` for any other state.
    pub fn from_job(job: &Job) -> Option<Self> {
        if job.status != JobStatus::Succeeded {
            return None;
        }
        let asset = job.result_asset.as_ref()?;

        Some(Self {
            id: job.id.clone(),
            url: asset.url(),
            prompt: job.prompt.clone(),
            timestamp: job.created_at,
            mode: job.mode,
            progress: job.progress_percent,
            status: job.status_message.clone(),
        })
    }
}
