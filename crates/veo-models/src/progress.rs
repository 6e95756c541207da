//! Progress updates surfaced to observers.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::{Job, JobId, JobStatus, LaneId};

/// A coarse progress notification for one job.
///
/// Fired on every job state transition and every poll tick. Observers use
/// it for display only; the job itself is the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub job_id: JobId,
    pub lane_id: LaneId,
    pub status: JobStatus,
    pub message: String,
    /// Heuristic percentage (0-100)
    pub percent: u8,
    pub timestamp: DateTime<Utc>,
}

impl ProgressUpdate {
    /// Snapshot the observable fields of a job.
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id.clone(),
            lane_id: job.lane_id,
            status: job.status,
            message: job.status_message.clone(),
            percent: job.progress_percent,
            timestamp: job.updated_at,
        }
    }
}
