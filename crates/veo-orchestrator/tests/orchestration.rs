mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_test::assert_ok;

use common::{Event, ScriptedProvider};
use veo_models::{JobStatus, ReferenceImage, RunOutcome, RunState, VideoMode};
use veo_orchestrator::{
    ChannelNotifier, InMemoryHistory, JsonlHistory, NotifierEvent, Orchestrator, OrchestratorConfig, RunRequest,
};

fn orchestrator(provider: &Arc<ScriptedProvider>) -> Orchestrator {
    Orchestrator::new(provider.clone(), OrchestratorConfig::default())
}

fn slots(prompts: &[&str]) -> Vec<String> {
    prompts.iter().map(|p| p.to_string()).collect()
}

fn image(name: &str) -> ReferenceImage {
    ReferenceImage::new(name, "image/png", vec![0x89, 0x50, 0x4e, 0x47])
}

#[tokio::test(start_paused = true)]
async fn chained_run_feeds_each_video_into_the_next_job() {
    let provider = Arc::new(ScriptedProvider::new(2));
    let handle = orchestrator(&provider)
        .start(RunRequest::chained(VideoMode::TextToVideo, "scene A\nscene B\n\n  scene C  "))
        .unwrap();

    let report = assert_ok!(handle.wait().await);
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.lanes.len(), 1);

    let jobs = &report.lanes[0].jobs;
    let prompts: Vec<_> = jobs.iter().map(|j| j.prompt.as_str()).collect();
    assert_eq!(prompts, vec!["scene A", "scene B", "scene C"]);

    assert!(jobs[0].chain_input.is_none());
    for pair in jobs.windows(2) {
        let previous = pair[0].result_asset.as_ref().map(|a| &a.handle);
        assert!(previous.is_some());
        assert_eq!(pair[1].chain_input.as_ref(), previous);
    }

    for job in jobs {
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.progress_percent, 100);
        assert_eq!(job.status_message, "Cinema Flow: Complete");
    }

    assert_eq!(
        provider.events(),
        vec![
            Event::Submitted("scene A".into()),
            Event::Finished("scene A".into()),
            Event::Submitted("scene B".into()),
            Event::Finished("scene B".into()),
            Event::Submitted("scene C".into()),
            Event::Finished("scene C".into()),
        ]
    );

    let submissions = provider.submissions();
    assert!(!submissions[0].needs_quality_model());
    assert!(submissions[1].needs_quality_model());
    assert_eq!(report.final_output(), jobs[2].result_asset.as_ref().map(|a| &a.handle));
}

#[tokio::test(start_paused = true)]
async fn concurrent_run_submits_every_lane_at_once() {
    let provider = Arc::new(ScriptedProvider::new(2));
    let handle = orchestrator(&provider)
        .start(RunRequest::concurrent(VideoMode::TextToVideo, slots(&["one", "two", "  ", "three"])))
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(handle.tasks().len(), 3);
    assert_eq!(handle.tasks().count_with_status(JobStatus::Polling), 3);
    assert_eq!(provider.submissions().len(), 3);

    let report = handle.wait().await.unwrap();
    assert_eq!(report.lanes.len(), 3);
    for (i, lane) in report.lanes.iter().enumerate() {
        assert_eq!(lane.lane_id.0, i as u32 + 1);
        assert_eq!(lane.jobs.len(), 1);
        assert_eq!(lane.jobs[0].status_message, format!("Lane {}: Complete", i + 1));
        assert!(lane.jobs[0].chain_input.is_none());
    }
    assert_eq!(report.succeeded(), 3);
}

#[tokio::test(start_paused = true)]
async fn failed_link_breaks_the_chain_without_stopping_the_lane() {
    let provider = Arc::new(ScriptedProvider::new(1).failing_submit("scene B"));
    let handle = orchestrator(&provider)
        .start(RunRequest::chained(VideoMode::TextToVideo, "scene A\nscene B\nscene C"))
        .unwrap();

    let report = handle.wait().await.unwrap();
    let jobs = &report.lanes[0].jobs;
    assert_eq!(jobs.len(), 3);

    assert_eq!(jobs[1].status, JobStatus::Failed);
    assert_eq!(jobs[1].progress_percent, 0);
    assert_eq!(jobs[1].status_message, "Cinema Flow: Error");
    assert!(jobs[1].error_message.as_deref().unwrap().contains("exhausted"));
    assert!(jobs[1].result_asset.is_none());

    assert_eq!(jobs[2].status, JobStatus::Succeeded);
    assert!(jobs[2].chain_input.is_none());
    assert_eq!(report.final_output(), jobs[2].result_asset.as_ref().map(|a| &a.handle));
}

#[tokio::test(start_paused = true)]
async fn poll_failure_fails_only_that_job() {
    let provider = Arc::new(ScriptedProvider::new(2).failing_poll("two"));
    let handle = orchestrator(&provider)
        .start(RunRequest::concurrent(VideoMode::TextToVideo, slots(&["one", "two"])))
        .unwrap();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);

    let failed = report.jobs().find(|j| j.prompt == "two").unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.progress_percent, 0);
    assert!(failed.error_message.as_deref().unwrap().contains("quota"));
}

#[tokio::test(start_paused = true)]
async fn image_to_video_without_an_image_fails_before_the_provider() {
    let provider = Arc::new(ScriptedProvider::new(1));
    let handle = orchestrator(&provider)
        .start(RunRequest::sequential(VideoMode::ImageToVideo, "animate this"))
        .unwrap();

    let report = handle.wait().await.unwrap();
    let job = &report.lanes[0].jobs[0];
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.as_deref().unwrap().starts_with("Invalid input"));
    assert!(provider.submissions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn interpolation_with_one_frame_fails_before_the_provider() {
    let provider = Arc::new(ScriptedProvider::new(1));
    let request = RunRequest::sequential(VideoMode::Interpolation, "walk from door to window")
        .with_references(vec![image("first")]);
    let handle = orchestrator(&provider).start(request).unwrap();

    let report = handle.wait().await.unwrap();
    let job = &report.lanes[0].jobs[0];
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.progress_percent, 0);
    assert!(job.error_message.as_deref().unwrap().starts_with("Invalid input"));
    assert!(provider.submissions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn interpolation_pairs_frames_per_prompt() {
    let provider = Arc::new(ScriptedProvider::new(1));
    let request = RunRequest::sequential(VideoMode::Interpolation, "first move\nsecond move")
        .with_references(vec![image("a1"), image("a2"), image("b1"), image("b2")]);
    let handle = orchestrator(&provider).start(request).unwrap();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.succeeded(), 2);

    let names: Vec<Vec<String>> = provider
        .submissions()
        .iter()
        .map(|s| s.reference_assets.iter().map(|r| r.name.clone()).collect())
        .collect();
    assert_eq!(names, vec![vec!["a1", "a2"], vec!["b1", "b2"]]);
}

#[tokio::test(start_paused = true)]
async fn blank_script_is_rejected_before_any_job_exists() {
    let provider = Arc::new(ScriptedProvider::new(1));
    let err = orchestrator(&provider)
        .start(RunRequest::chained(VideoMode::TextToVideo, "\n   \n\t\n"))
        .err()
        .unwrap();

    assert!(err.is_empty_input());
    assert!(provider.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_new_submissions_and_lets_in_flight_jobs_finish() {
    let provider = Arc::new(ScriptedProvider::new(2));
    let handle = orchestrator(&provider)
        .start(RunRequest::chained(VideoMode::TextToVideo, "a\nb\nc"))
        .unwrap();
    let tasks = handle.tasks().clone();
    let state = handle.subscribe_state();

    tokio::time::sleep(Duration::from_secs(1)).await;
    handle.request_cancel();
    handle.request_cancel();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.state(), RunState::Stopping { remaining: 20 });

    let report = handle.wait().await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.lanes[0].jobs.len(), 1);
    assert_eq!(report.lanes[0].jobs[0].status, JobStatus::Succeeded);
    assert_eq!(report.lanes[0].skipped, 2);

    assert_eq!(provider.submissions().len(), 1);
    assert_eq!(tasks.len(), 1);
    assert_eq!(*state.borrow(), RunState::Finished { outcome: RunOutcome::Completed });
}

#[tokio::test(start_paused = true)]
async fn cancel_before_lanes_start_submits_nothing() {
    let provider = Arc::new(ScriptedProvider::new(1));
    let handle = orchestrator(&provider)
        .start(RunRequest::concurrent(VideoMode::TextToVideo, slots(&["a", "b"])))
        .unwrap();
    handle.request_cancel();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.jobs().count(), 0);
    assert!(report.lanes.iter().all(|l| l.skipped == 1));
    assert!(provider.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn grace_countdown_force_stops_and_late_results_still_land() {
    let provider = Arc::new(ScriptedProvider::new(10));
    let history = Arc::new(InMemoryHistory::new());
    let handle = orchestrator(&provider)
        .with_history(history.clone())
        .start(RunRequest::concurrent(VideoMode::TextToVideo, slots(&["slow one", "slow two"])))
        .unwrap();
    let tasks = handle.tasks().clone();
    let state = handle.subscribe_state();

    tokio::time::sleep(Duration::from_secs(1)).await;
    let cancelled_at = Instant::now();
    handle.request_cancel();

    let report = handle.wait().await.unwrap();
    let waited = cancelled_at.elapsed();
    assert_eq!(report.outcome, RunOutcome::ForceStopped);
    assert!(report.is_force_stopped());
    assert!(report.lanes.is_empty());
    assert!(waited >= Duration::from_secs(20) && waited < Duration::from_secs(22));
    assert_eq!(tasks.active_count(), 2);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(tasks.count_with_status(JobStatus::Succeeded), 2);
    assert_eq!(history.len().await, 2);
    assert_eq!(*state.borrow(), RunState::Finished { outcome: RunOutcome::ForceStopped });
}

#[tokio::test(start_paused = true)]
async fn zero_grace_ticks_force_stops_immediately() {
    let provider = Arc::new(ScriptedProvider::new(10));
    let config = OrchestratorConfig {
        cancel_grace_ticks: 0,
        ..OrchestratorConfig::default()
    };
    let handle = Orchestrator::new(provider.clone(), config)
        .start(RunRequest::chained(VideoMode::TextToVideo, "a\nb"))
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    let cancelled_at = Instant::now();
    handle.request_cancel();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.outcome, RunOutcome::ForceStopped);
    assert!(cancelled_at.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn rejected_key_raises_the_credentials_signal() {
    let provider = Arc::new(ScriptedProvider::new(1).rejecting_key("b"));
    let (notifier, mut events) = ChannelNotifier::channel(256);
    let handle = orchestrator(&provider)
        .with_notifier(Arc::new(notifier))
        .start(RunRequest::concurrent(VideoMode::TextToVideo, slots(&["a", "b"])))
        .unwrap();

    let report = handle.wait().await.unwrap();
    let rejected = report.jobs().find(|j| j.prompt == "b").unwrap();
    let accepted = report.jobs().find(|j| j.prompt == "a").unwrap();
    assert_eq!(rejected.status, JobStatus::Failed);
    assert_eq!(accepted.status, JobStatus::Succeeded);

    let mut credential_signals = Vec::new();
    let mut accepted_percents = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            NotifierEvent::CredentialsRejected { job_id, .. } => credential_signals.push(job_id),
            NotifierEvent::Progress(update) if update.job_id == accepted.id => accepted_percents.push(update.percent),
            NotifierEvent::Progress(_) => {}
        }
    }

    assert_eq!(credential_signals, vec![rejected.id.clone()]);
    assert!(accepted_percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(accepted_percents.first(), Some(&5));
    assert_eq!(accepted_percents.last(), Some(&100));
}

#[tokio::test(start_paused = true)]
async fn history_receives_each_success_once() {
    let provider = Arc::new(ScriptedProvider::new(1).failing_submit("b"));
    let history = Arc::new(InMemoryHistory::new());
    let handle = orchestrator(&provider)
        .with_history(history.clone())
        .start(RunRequest::sequential(VideoMode::TextToVideo, "a\nb\nc"))
        .unwrap();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.succeeded(), 2);

    let entries = history.entries().await;
    let prompts: Vec<_> = entries.iter().map(|e| e.prompt.as_str()).collect();
    assert_eq!(prompts, vec!["a", "c"]);
    assert!(entries.iter().all(|e| e.progress == 100 && e.status == "Complete"));
    assert!(entries.iter().all(|e| e.url.starts_with("https://videos.test/")));
}

#[tokio::test(start_paused = true)]
async fn task_list_keeps_newest_job_first() {
    let provider = Arc::new(ScriptedProvider::new(1));
    let handle = orchestrator(&provider)
        .start(RunRequest::sequential(VideoMode::TextToVideo, "first\nsecond"))
        .unwrap();
    let tasks = handle.tasks().clone();

    handle.wait().await.unwrap();
    let snapshot = tasks.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].prompt, "second");
    assert_eq!(tasks.latest().map(|j| j.prompt), Some("second".to_string()));
}

#[tokio::test]
async fn jsonl_history_persists_successes() {
    let dir = tempfile::tempdir().unwrap();
    let history = Arc::new(JsonlHistory::new(dir.path().join("history.jsonl")));
    let provider = Arc::new(ScriptedProvider::new(1));
    let config = OrchestratorConfig {
        poll_interval: Duration::from_millis(5),
        ..OrchestratorConfig::default()
    };

    let handle = Orchestrator::new(provider.clone(), config)
        .with_history(history.clone())
        .start(RunRequest::sequential(VideoMode::TextToVideo, "dawn\ndusk"))
        .unwrap();
    handle.wait().await.unwrap();

    let entries = history.load().await.unwrap();
    let prompts: Vec<_> = entries.iter().map(|e| e.prompt.as_str()).collect();
    assert_eq!(prompts, vec!["dawn", "dusk"]);
}
