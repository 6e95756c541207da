//! Per-job structured logging.
//!
//! Every line carries the job, its lane and position in the lane, so a
//! concurrent run can be read back one job at a time.

use tracing::{error, info, info_span, warn, Span};

use veo_models::{Job, VideoAsset, VideoMode};

#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    lane_id: u32,
    sequence: usize,
    mode: VideoMode,
    chained: bool,
}

impl JobLogger {
    pub fn for_job(job: &Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            lane_id: job.lane_id.0,
            sequence: job.sequence,
            mode: job.mode,
            chained: job.chain_input.is_some(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Span wrapping the whole job, from submit to terminal state.
    pub fn span(&self) -> Span {
        info_span!(
            "generate_video",
            job_id = %self.job_id,
            lane_id = self.lane_id,
            sequence = self.sequence,
            mode = %self.mode,
            chained = self.chained,
        )
    }

    pub fn submitting(&self, prompt: &str, references: usize) {
        info!(job_id = %self.job_id, references, "Submitting: {}", prompt);
    }

    pub fn tick(&self, message: &str, percent: u8) {
        info!(job_id = %self.job_id, percent, "{}", message);
    }

    /// Something degraded but the job goes on.
    pub fn degraded(&self, message: &str) {
        warn!(job_id = %self.job_id, "{}", message);
    }

    /// `kind` is the metric label of the failure.
    pub fn failed(&self, kind: &str, message: &str) {
        error!(job_id = %self.job_id, kind, "Job failed: {}", message);
    }

    /// Logs the provider URI, never the keyed download link.
    pub fn completed(&self, asset: &VideoAsset) {
        info!(
            job_id = %self.job_id,
            uri = %asset.handle.uri,
            local = asset.location.is_local(),
            "Job completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veo_models::{LaneId, VideoHandle};

    #[test]
    fn test_logger_takes_job_context() {
        let job = Job::new(
            LaneId(2),
            1,
            VideoMode::TextToVideo,
            "scene B",
            Vec::new(),
            Some(VideoHandle::new("https://videos.test/a.mp4")),
        );
        let logger = JobLogger::for_job(&job);

        assert_eq!(logger.job_id(), job.id.to_string());
        assert_eq!(logger.lane_id, 2);
        assert_eq!(logger.sequence, 1);
        assert!(logger.chained);
    }
}
