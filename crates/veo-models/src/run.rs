//! Run lifecycle state.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every lane reached the end of its work
    Completed,
    /// The cancellation grace countdown elapsed with lanes still running
    ForceStopped,
}

/// Observable run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    /// Lanes are running
    #[default]
    Running,
    /// Cancellation requested; `remaining` countdown ticks before giving up
    Stopping { remaining: u32 },
    /// The run is over; observers get no further run-level signals
    Finished { outcome: RunOutcome },
}

impl RunState {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunState::Finished { .. })
    }

    pub fn is_stopping(&self) -> bool {
        matches!(self, RunState::Stopping { .. })
    }
}
