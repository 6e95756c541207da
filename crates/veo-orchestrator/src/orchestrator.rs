//! Run orchestration.
//!
//! An [`Orchestrator`] turns one [`RunRequest`] into lanes, spawns them and
//! supervises the run: it watches for a cancel request, runs the grace
//! countdown and publishes [`RunState`] changes. Lanes stop submitting as
//! soon as cancellation is requested; the countdown only bounds how long the
//! run waits for jobs already in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use veo_client::VideoProvider;
use veo_models::{Job, LaneId, ReferenceImage, RunId, RunOutcome, RunState, VideoHandle, VideoMode};

use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::history::{HistorySink, InMemoryHistory};
use crate::job_runner::JobRunner;
use crate::lane::{LaneLabel, LaneReport, LaneRunner, LaneSpec, PromptUnit};
use crate::metrics;
use crate::progress::{NoopNotifier, ProgressNotifier};
use crate::script::{split_script, ReferencePool};
use crate::task_list::TaskList;

/// How a run spreads its prompts over lanes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPlan {
    /// One lane, each job continuing the previous video
    Chained,
    /// One lane, independent jobs in script order
    Sequential,
    /// One lane per non-blank slot, all running in parallel
    Concurrent { slots: Vec<String> },
}

impl RunPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPlan::Chained => "chained",
            RunPlan::Sequential => "sequential",
            RunPlan::Concurrent { .. } => "concurrent",
        }
    }
}

/// One user-triggered generation request.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub mode: VideoMode,
    /// Multi-line script, used by the single-lane plans
    pub script: String,
    pub plan: RunPlan,
    pub references: ReferencePool,
    pub negative_prompt: Option<String>,
}

impl RunRequest {
    pub fn chained(mode: VideoMode, script: impl Into<String>) -> Self {
        Self::new(mode, script.into(), RunPlan::Chained)
    }

    pub fn sequential(mode: VideoMode, script: impl Into<String>) -> Self {
        Self::new(mode, script.into(), RunPlan::Sequential)
    }

    pub fn concurrent(mode: VideoMode, slots: Vec<String>) -> Self {
        Self::new(mode, String::new(), RunPlan::Concurrent { slots })
    }

    fn new(mode: VideoMode, script: String, plan: RunPlan) -> Self {
        Self {
            mode,
            script,
            plan,
            references: ReferencePool::default(),
            negative_prompt: None,
        }
    }

    pub fn with_references(mut self, images: Vec<ReferenceImage>) -> Self {
        self.references = ReferencePool::new(images);
        self
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative_prompt.into());
        self
    }

    /// 0 for the single-lane plans, otherwise the number of slots offered.
    pub fn concurrency_width(&self) -> usize {
        match &self.plan {
            RunPlan::Chained | RunPlan::Sequential => 0,
            RunPlan::Concurrent { slots } => slots.len(),
        }
    }

    /// Lay the request out as lanes.
    ///
    /// Fails with `EmptyInput` before anything is created when no prompt
    /// remains after trimming.
    pub fn plan_lanes(&self) -> OrchestratorResult<Vec<LaneSpec>> {
        let single_lane = |label: LaneLabel, chained: bool| -> OrchestratorResult<Vec<LaneSpec>> {
            let units = split_script(&self.script)?
                .into_iter()
                .enumerate()
                .map(|(i, prompt)| PromptUnit::new(prompt, self.references.assets_for(self.mode, i)))
                .collect();
            Ok(vec![LaneSpec {
                lane_id: LaneId(1),
                label,
                mode: self.mode,
                negative_prompt: self.negative_prompt.clone(),
                units,
                chained,
            }])
        };

        match &self.plan {
            RunPlan::Chained => single_lane(LaneLabel::CinemaFlow, true),
            RunPlan::Sequential => single_lane(LaneLabel::Plain, false),
            RunPlan::Concurrent { slots } => {
                let prompts: Vec<&str> = slots
                    .iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .collect();
                if prompts.is_empty() {
                    return Err(OrchestratorError::EmptyInput);
                }

                Ok(prompts
                    .into_iter()
                    .enumerate()
                    .map(|(i, prompt)| {
                        let lane_id = LaneId(i as u32 + 1);
                        LaneSpec {
                            lane_id,
                            label: LaneLabel::Numbered(lane_id),
                            mode: self.mode,
                            negative_prompt: self.negative_prompt.clone(),
                            units: vec![PromptUnit::new(prompt, self.references.assets_for(self.mode, i))],
                            chained: false,
                        }
                    })
                    .collect())
            }
        }
    }
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub outcome: RunOutcome,
    /// Reports of the lanes that finished before the run ended, by lane ID.
    /// Lanes abandoned by a force stop are absent.
    pub lanes: Vec<LaneReport>,
}

impl RunReport {
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.lanes.iter().flat_map(|l| l.jobs.iter())
    }

    pub fn succeeded(&self) -> usize {
        self.lanes.iter().map(LaneReport::succeeded).sum()
    }

    pub fn failed(&self) -> usize {
        self.lanes.iter().map(LaneReport::failed).sum()
    }

    pub fn is_force_stopped(&self) -> bool {
        self.outcome == RunOutcome::ForceStopped
    }

    /// Last video of the chained lane, for continuing the sequence.
    pub fn final_output(&self) -> Option<&VideoHandle> {
        self.lanes
            .iter()
            .find(|l| l.chained)
            .and_then(|l| l.final_output.as_ref())
    }
}

/// Requests cancellation of a run. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RunCanceller {
    tx: Arc<watch::Sender<bool>>,
}

impl RunCanceller {
    /// Stop new submissions and start the grace countdown. Idempotent.
    pub fn request_cancel(&self) {
        if !self.tx.send_replace(true) {
            info!("Cancellation requested");
        }
    }

    pub fn is_cancel_requested(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Handle to a running run.
pub struct RunHandle {
    run_id: RunId,
    tasks: TaskList,
    state: watch::Receiver<RunState>,
    canceller: RunCanceller,
    report: JoinHandle<RunReport>,
}

impl RunHandle {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Live jobs of every lane, newest first.
    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        self.state.clone()
    }

    pub fn request_cancel(&self) {
        self.canceller.request_cancel();
    }

    pub fn canceller(&self) -> RunCanceller {
        self.canceller.clone()
    }

    /// Wait for the run to finish or be force stopped.
    pub async fn wait(self) -> OrchestratorResult<RunReport> {
        self.report
            .await
            .map_err(|e| OrchestratorError::TaskFailed(e.to_string()))
    }
}

/// Entry point for generation runs.
pub struct Orchestrator {
    provider: Arc<dyn VideoProvider>,
    notifier: Arc<dyn ProgressNotifier>,
    history: Arc<dyn HistorySink>,
    config: Arc<OrchestratorConfig>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn VideoProvider>, config: OrchestratorConfig) -> Self {
        Self {
            provider,
            notifier: Arc::new(NoopNotifier),
            history: Arc::new(InMemoryHistory::new()),
            config: Arc::new(config),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ProgressNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_history(mut self, history: Arc<dyn HistorySink>) -> Self {
        self.history = history;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Plan the request and spawn its lanes. Must be called inside a Tokio runtime.
    pub fn start(&self, request: RunRequest) -> OrchestratorResult<RunHandle> {
        let lanes = request.plan_lanes()?;
        let run_id = RunId::new();
        let tasks = TaskList::new();

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(RunState::Running);

        let runner = JobRunner::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.notifier),
            Arc::clone(&self.history),
            tasks.clone(),
            Arc::clone(&self.config),
        );

        info!(
            run_id = %run_id,
            plan = request.plan.as_str(),
            mode = %request.mode,
            lanes = lanes.len(),
            "Starting run"
        );
        metrics::record_run_started(request.plan.as_str());

        let mut set = JoinSet::new();
        for spec in lanes {
            set.spawn(LaneRunner::new(spec, runner.clone(), cancel_rx.clone()).run());
        }

        let supervisor = Supervisor {
            run_id: run_id.clone(),
            lanes: set,
            cancel_rx,
            state_tx,
            grace_ticks: self.config.cancel_grace_ticks,
            tick: self.config.cancel_tick,
        };
        let report = tokio::spawn(supervisor.run());

        Ok(RunHandle {
            run_id,
            tasks,
            state: state_rx,
            canceller: RunCanceller {
                tx: Arc::new(cancel_tx),
            },
            report,
        })
    }
}

struct Supervisor {
    run_id: RunId,
    lanes: JoinSet<LaneReport>,
    cancel_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<RunState>,
    grace_ticks: u32,
    tick: Duration,
}

impl Supervisor {
    async fn run(mut self) -> RunReport {
        let mut reports = Vec::new();
        let mut stopping = false;
        let mut cancel_closed = false;
        let mut remaining = self.grace_ticks;

        let mut countdown = interval_at(Instant::now() + self.tick, self.tick);
        countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let outcome = loop {
            tokio::select! {
                joined = self.lanes.join_next() => match joined {
                    Some(Ok(report)) => reports.push(report),
                    Some(Err(e)) => error!(run_id = %self.run_id, "Lane task failed: {}", e),
                    None => break RunOutcome::Completed,
                },
                changed = self.cancel_rx.changed(), if !stopping && !cancel_closed => {
                    if changed.is_err() {
                        cancel_closed = true;
                        continue;
                    }
                    if !*self.cancel_rx.borrow_and_update() {
                        continue;
                    }

                    stopping = true;
                    info!(
                        run_id = %self.run_id,
                        lanes_running = self.lanes.len(),
                        grace_ticks = self.grace_ticks,
                        "Run stopping"
                    );
                    if remaining == 0 {
                        break RunOutcome::ForceStopped;
                    }
                    countdown.reset();
                    self.state_tx.send_replace(RunState::Stopping { remaining });
                }
                _ = countdown.tick(), if stopping => {
                    remaining -= 1;
                    if remaining == 0 {
                        break RunOutcome::ForceStopped;
                    }
                    self.state_tx.send_replace(RunState::Stopping { remaining });
                }
            }
        };

        if outcome == RunOutcome::ForceStopped {
            warn!(
                run_id = %self.run_id,
                abandoned_lanes = self.lanes.len(),
                "Grace countdown elapsed, giving up on in-flight jobs"
            );
            // In-flight jobs keep running and still update the task list.
            self.lanes.detach_all();
            metrics::record_run_force_stopped();
        }

        reports.sort_by_key(|r| r.lane_id.0);
        self.state_tx.send_replace(RunState::Finished { outcome });
        info!(run_id = %self.run_id, outcome = ?outcome, lanes = reports.len(), "Run finished");

        RunReport {
            run_id: self.run_id,
            outcome,
            lanes: reports,
        }
    }
}
