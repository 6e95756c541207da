//! Orchestrator configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use veo_models::{AspectRatio, Resolution};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Delay between polls of an in-flight generation
    pub poll_interval: Duration,
    /// Countdown ticks between a cancel request and giving up on the run
    pub cancel_grace_ticks: u32,
    /// Length of one countdown tick
    pub cancel_tick: Duration,
    /// Progress shown once a job starts submitting
    pub initial_progress: u8,
    /// Heuristic progress added per poll tick
    pub progress_step: u8,
    /// Ceiling for heuristic progress before the job completes
    pub progress_cap: u8,
    /// Resolution requested for unchained jobs
    pub resolution: Resolution,
    /// Frame shape requested for every job
    pub aspect_ratio: AspectRatio,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(8),
            cancel_grace_ticks: 20,
            cancel_tick: Duration::from_secs(1),
            initial_progress: 5,
            progress_step: 3,
            progress_cap: 99,
            resolution: Resolution::R720p,
            aspect_ratio: AspectRatio::Landscape,
        }
    }
}

impl OrchestratorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> OrchestratorResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from a variable lookup. Unset variables keep their
    /// defaults; set but unparsable ones are rejected.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> OrchestratorResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            poll_interval: Duration::from_secs(parse_var(
                &lookup,
                "VEO_POLL_INTERVAL_SECS",
                defaults.poll_interval.as_secs(),
            )?),
            cancel_grace_ticks: parse_var(&lookup, "VEO_CANCEL_GRACE_TICKS", defaults.cancel_grace_ticks)?,
            cancel_tick: Duration::from_millis(parse_var(
                &lookup,
                "VEO_CANCEL_TICK_MS",
                defaults.cancel_tick.as_millis() as u64,
            )?),
            resolution: parse_var(&lookup, "VEO_RESOLUTION", defaults.resolution)?,
            aspect_ratio: parse_var(&lookup, "VEO_ASPECT_RATIO", defaults.aspect_ratio)?,
            ..defaults
        })
    }

    /// Total time a cancelled run waits for lanes before giving up.
    pub fn cancel_grace_period(&self) -> Duration {
        self.cancel_tick.saturating_mul(self.cancel_grace_ticks)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> OrchestratorResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| OrchestratorError::config_error(format!("{}={:?}: {}", name, raw, e))),
    }
}
