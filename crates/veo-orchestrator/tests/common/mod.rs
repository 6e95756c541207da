//! Scripted in-memory provider for orchestration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use veo_client::{GenerationRequest, PollStatus, ProviderError, ProviderHandle, ProviderResult, VideoProvider};
use veo_models::{AssetLocation, VideoHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Submitted(String),
    Finished(String),
    Failed(String),
}

struct Operation {
    prompt: String,
    polls_left: u32,
}

#[derive(Default)]
struct State {
    next_id: usize,
    operations: HashMap<String, Operation>,
    events: Vec<Event>,
    submissions: Vec<GenerationRequest>,
}

/// Provider whose every generation finishes on the `polls_until_done`-th
/// poll, with per-prompt failures.
pub struct ScriptedProvider {
    polls_until_done: u32,
    failing_submit: HashSet<String>,
    failing_poll: HashSet<String>,
    rejecting_key: HashSet<String>,
    state: Mutex<State>,
}

impl ScriptedProvider {
    pub fn new(polls_until_done: u32) -> Self {
        Self {
            polls_until_done: polls_until_done.max(1),
            failing_submit: HashSet::new(),
            failing_poll: HashSet::new(),
            rejecting_key: HashSet::new(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn failing_submit(mut self, prompt: &str) -> Self {
        self.failing_submit.insert(prompt.to_string());
        self
    }

    pub fn failing_poll(mut self, prompt: &str) -> Self {
        self.failing_poll.insert(prompt.to_string());
        self
    }

    pub fn rejecting_key(mut self, prompt: &str) -> Self {
        self.rejecting_key.insert(prompt.to_string());
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    /// Requests that passed validation and reached the provider.
    pub fn submissions(&self) -> Vec<GenerationRequest> {
        self.state.lock().unwrap().submissions.clone()
    }

    fn fail(&self, prompt: &str, error: ProviderError) -> ProviderError {
        self.state.lock().unwrap().events.push(Event::Failed(prompt.to_string()));
        error
    }
}

#[async_trait]
impl VideoProvider for ScriptedProvider {
    async fn submit(&self, request: &GenerationRequest) -> ProviderResult<ProviderHandle> {
        request.validate()?;

        if self.rejecting_key.contains(&request.prompt) {
            return Err(self.fail(&request.prompt, ProviderError::from_provider_message("API key not valid. Please pass a valid API key.")));
        }
        if self.failing_submit.contains(&request.prompt) {
            return Err(self.fail(&request.prompt, ProviderError::provider("Resource has been exhausted")));
        }

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let name = format!("operations/op-{}", state.next_id);
        state.operations.insert(
            name.clone(),
            Operation {
                prompt: request.prompt.clone(),
                polls_left: self.polls_until_done,
            },
        );
        state.events.push(Event::Submitted(request.prompt.clone()));
        state.submissions.push(request.clone());
        Ok(ProviderHandle::new(name))
    }

    async fn poll(&self, handle: &ProviderHandle) -> ProviderResult<PollStatus> {
        let mut state = self.state.lock().unwrap();
        let op = state
            .operations
            .get_mut(&handle.operation_name)
            .ok_or_else(|| ProviderError::provider("unknown operation"))?;

        if self.failing_poll.contains(&op.prompt) {
            let prompt = op.prompt.clone();
            state.events.push(Event::Failed(prompt));
            return Err(ProviderError::provider("quota exceeded"));
        }

        op.polls_left -= 1;
        if op.polls_left > 0 {
            return Ok(PollStatus::Pending);
        }

        let prompt = op.prompt.clone();
        let uri = format!("https://videos.test/{}.mp4", handle.operation_name.trim_start_matches("operations/"));
        state.events.push(Event::Finished(prompt));
        Ok(PollStatus::Done(VideoHandle::new(uri)))
    }

    async fn fetch_asset(&self, video: &VideoHandle) -> AssetLocation {
        AssetLocation::Remote(video.uri.clone())
    }
}
