//! Drives one job through submit, poll and fetch.

use std::sync::Arc;

use tracing::Instrument;

use veo_client::{GenerationRequest, PollStatus, ProviderError, VideoProvider};
use veo_models::{HistoryEntry, Job, ProgressUpdate, VideoAsset};

use crate::config::OrchestratorConfig;
use crate::history::HistorySink;
use crate::lane::LaneLabel;
use crate::logging::JobLogger;
use crate::metrics;
use crate::progress::ProgressNotifier;
use crate::task_list::TaskList;

pub const MSG_PREPARING: &str = "Preparing script...";
pub const MSG_PROCESSING: &str = "Processing video (Veo 3.1)...";
pub const MSG_RENDERING: &str = "Rendering scene...";
pub const MSG_SYNCING: &str = "Syncing file...";
pub const MSG_COMPLETE: &str = "Complete";
pub const MSG_ERROR: &str = "Error";

/// Runs jobs against a provider, publishing every transition to the task
/// list and the progress notifier.
#[derive(Clone)]
pub struct JobRunner {
    provider: Arc<dyn VideoProvider>,
    notifier: Arc<dyn ProgressNotifier>,
    history: Arc<dyn HistorySink>,
    tasks: TaskList,
    config: Arc<OrchestratorConfig>,
}

impl JobRunner {
    /// Build a runner over a provider, a notifier and a history store.
    pub fn new(
        provider: Arc<dyn VideoProvider>,
        notifier: Arc<dyn ProgressNotifier>,
        history: Arc<dyn HistorySink>,
        tasks: TaskList,
        config: Arc<OrchestratorConfig>,
    ) -> Self {
        Self {
            provider,
            notifier,
            history,
            tasks,
            config,
        }
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    /// Run a queued job to a terminal state and return it.
    ///
    /// Never fails: provider errors are recorded on the job.
    pub async fn run(&self, job: Job, label: &LaneLabel) -> Job {
        let logger = JobLogger::for_job(&job);
        let span = logger.span();
        self.drive(job, label, &logger).instrument(span).await
    }

    async fn drive(&self, mut job: Job, label: &LaneLabel, logger: &JobLogger) -> Job {
        let config = &self.config;

        if let Err(e) = job.begin_submit(label.message(MSG_PREPARING), config.initial_progress) {
            logger.degraded(&e.to_string());
            return job;
        }
        logger.submitting(&job.prompt, job.reference_assets.len());
        self.publish(&job);

        let request = GenerationRequest::for_job(&job, config.resolution, config.aspect_ratio);
        metrics::record_job_submitted(job.mode.as_str());

        let handle = match self.provider.submit(&request).await {
            Ok(handle) => handle,
            Err(e) => return self.fail(job, e, label, logger),
        };

        if let Err(e) = job.begin_polling(label.message(MSG_PROCESSING), config.progress_step, config.progress_cap) {
            logger.degraded(&e.to_string());
            return job;
        }
        self.publish(&job);

        let video = loop {
            tokio::time::sleep(config.poll_interval).await;
            metrics::record_poll_tick();

            match self.provider.poll(&handle).await {
                Ok(PollStatus::Pending) => {
                    self.tick(&mut job, label.message(MSG_RENDERING), logger);
                }
                Ok(PollStatus::Done(video)) => {
                    self.tick(&mut job, label.message(MSG_SYNCING), logger);
                    break video;
                }
                Err(e) => return self.fail(job, e, label, logger),
            }
        };

        let location = self.provider.fetch_asset(&video).await;
        if !location.is_local() {
            logger.degraded("video kept as a remote link");
        }

        if let Err(e) = job.succeed(VideoAsset::new(video, location), label.message(MSG_COMPLETE)) {
            logger.degraded(&e.to_string());
            return job;
        }
        self.publish(&job);
        metrics::record_job_succeeded(job.mode.as_str());
        if let Some(asset) = &job.result_asset {
            logger.completed(asset);
        }

        if let Some(entry) = HistoryEntry::from_job(&job) {
            self.history.on_job_succeeded(entry).await;
        }

        job
    }

    fn tick(&self, job: &mut Job, message: String, logger: &JobLogger) {
        match job.record_tick(message, self.config.progress_step, self.config.progress_cap) {
            Ok(()) => {
                logger.tick(&job.status_message, job.progress_percent);
                self.publish(job);
            }
            Err(e) => logger.degraded(&e.to_string()),
        }
    }

    fn fail(&self, mut job: Job, error: ProviderError, label: &LaneLabel, logger: &JobLogger) -> Job {
        let message = error.to_string();
        let kind = match &error {
            ProviderError::InvalidInput(_) => "invalid_input",
            ProviderError::Auth(_) => "auth",
            _ => "provider",
        };
        logger.failed(kind, &message);

        if let Err(e) = job.fail(message.clone(), label.message(MSG_ERROR)) {
            logger.degraded(&e.to_string());
            return job;
        }
        self.publish(&job);
        metrics::record_job_failed(job.mode.as_str(), kind);

        if error.is_auth() {
            self.notifier.on_credentials_rejected(&job.id, &message);
        }

        job
    }

    fn publish(&self, job: &Job) {
        self.tasks.upsert(job.clone());
        self.notifier.on_progress(&ProgressUpdate::from_job(job));
    }
}
