//! Lane runner: one sequential stream of jobs.
//!
//! Jobs in a lane never overlap: job `i+1` is created only after job `i`
//! reaches a terminal state. In a chained lane each job is conditioned on
//! the previous job's video; a failed link breaks the chain and the next
//! job runs unconditioned instead of aborting the lane.

use tokio::sync::watch;
use tracing::info;

use veo_models::{Job, LaneId, ReferenceImage, VideoHandle, VideoMode};

use crate::job_runner::JobRunner;
use crate::metrics;

/// Display prefix for a lane's status messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaneLabel {
    /// No prefix (single sequential lane)
    Plain,
    /// `Lane N: `
    Numbered(LaneId),
    /// `Cinema Flow: ` (continuous chained sequence)
    CinemaFlow,
}

impl LaneLabel {
    pub fn message(&self, text: &str) -> String {
        match self {
            LaneLabel::Plain => text.to_string(),
            LaneLabel::Numbered(id) => format!("Lane {}: {}", id, text),
            LaneLabel::CinemaFlow => format!("Cinema Flow: {}", text),
        }
    }
}

/// One prompt plus the reference images assigned to it.
#[derive(Debug, Clone)]
pub struct PromptUnit {
    pub prompt: String,
    pub references: Vec<ReferenceImage>,
}

impl PromptUnit {
    /// Pair a prompt with its conditioning images.
    pub fn new(prompt: impl Into<String>, references: Vec<ReferenceImage>) -> Self {
        Self {
            prompt: prompt.into(),
            references,
        }
    }
}

/// What a lane should run.
#[derive(Debug, Clone)]
pub struct LaneSpec {
    pub lane_id: LaneId,
    pub label: LaneLabel,
    pub mode: VideoMode,
    pub negative_prompt: Option<String>,
    pub units: Vec<PromptUnit>,
    pub chained: bool,
}

/// Outcome of a lane.
#[derive(Debug, Clone)]
pub struct LaneReport {
    pub lane_id: LaneId,
    pub chained: bool,
    /// Every job the lane ran, in submission order, all terminal
    pub jobs: Vec<Job>,
    /// Units never submitted because cancellation was requested
    pub skipped: usize,
    /// Output of the last job of a chained lane, for continuing the sequence
    pub final_output: Option<VideoHandle>,
}

impl LaneReport {
    pub fn succeeded(&self) -> usize {
        self.jobs.iter().filter(|j| j.result_asset.is_some()).count()
    }

    pub fn failed(&self) -> usize {
        self.jobs.len() - self.succeeded()
    }
}

pub struct LaneRunner {
    spec: LaneSpec,
    runner: JobRunner,
    cancel: watch::Receiver<bool>,
}

impl LaneRunner {
    /// Runner for one lane; stops picking up prompts once `cancel` flips to true.
    pub fn new(spec: LaneSpec, runner: JobRunner, cancel: watch::Receiver<bool>) -> Self {
        Self {
            spec,
            runner,
            cancel,
        }
    }

    pub fn lane_id(&self) -> LaneId {
        self.spec.lane_id
    }

    /// Run every unit in order until done or cancelled.
    pub async fn run(self) -> LaneReport {
        let LaneRunner { spec, runner, cancel } = self;
        let LaneSpec {
            lane_id,
            label,
            mode,
            negative_prompt,
            units,
            chained,
        } = spec;

        metrics::record_lane_started();
        info!(lane_id = lane_id.0, units = units.len(), chained, "Lane started");

        let total = units.len();
        let mut jobs = Vec::with_capacity(total);
        let mut previous: Option<VideoHandle> = None;

        for (sequence, unit) in units.into_iter().enumerate() {
            if *cancel.borrow() {
                info!(lane_id = lane_id.0, remaining = total - sequence, "Cancellation requested, lane stops submitting");
                break;
            }

            let chain_input = if chained { previous.take() } else { None };
            let references = if chain_input.is_some() {
                Vec::new()
            } else {
                unit.references
            };

            let job = Job::new(lane_id, sequence, mode, unit.prompt, references, chain_input)
                .with_negative_prompt(negative_prompt.clone());
            let job = runner.run(job, &label).await;

            previous = job.chain_output();
            jobs.push(job);
        }

        let final_output = if chained {
            jobs.last().and_then(Job::chain_output)
        } else {
            None
        };

        metrics::record_lane_finished();
        let report = LaneReport {
            lane_id,
            chained,
            skipped: total - jobs.len(),
            jobs,
            final_output,
        };
        info!(
            lane_id = lane_id.0,
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped,
            "Lane finished"
        );
        report
    }
}
