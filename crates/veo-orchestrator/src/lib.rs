//! Job orchestration for Veo video generation runs.
//!
//! This crate provides:
//! - Script splitting and reference image assignment
//! - The per-job state machine driver (submit, poll, fetch)
//! - Lane runners, sequential and chained
//! - Run supervision with cooperative cancellation and a grace countdown
//! - The aggregate task list plus progress and history observers

pub mod config;
pub mod error;
pub mod history;
pub mod job_runner;
pub mod lane;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod progress;
pub mod script;
pub mod task_list;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, OrchestratorResult};
pub use history::{HistorySink, InMemoryHistory, JsonlHistory};
pub use job_runner::JobRunner;
pub use lane::{LaneLabel, LaneReport, LaneRunner, LaneSpec, PromptUnit};
pub use logging::JobLogger;
pub use orchestrator::{Orchestrator, RunCanceller, RunHandle, RunPlan, RunReport, RunRequest};
pub use progress::{ChannelNotifier, NoopNotifier, NotifierEvent, ProgressNotifier, TracingNotifier};
pub use script::{extract_bracketed_prompts, split_script, ReferencePool};
pub use task_list::TaskList;
