//! Progress notification for generation jobs.
//!
//! Notifiers are fire-and-forget sinks. A dropped event only affects what
//! an observer displays; job state lives on the job and in the task list.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use veo_models::{JobId, ProgressUpdate};

/// Observer of job progress.
pub trait ProgressNotifier: Send + Sync {
    /// Called on every job state transition and every poll tick.
    fn on_progress(&self, update: &ProgressUpdate);

    /// Called when the provider rejected or could not find credentials.
    /// Distinct from ordinary failures so the caller can ask for a new key.
    fn on_credentials_rejected(&self, _job_id: &JobId, _message: &str) {}
}

/// Notifier that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ProgressNotifier for NoopNotifier {
    fn on_progress(&self, _update: &ProgressUpdate) {}
}

/// Notifier that writes progress to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl ProgressNotifier for TracingNotifier {
    fn on_progress(&self, update: &ProgressUpdate) {
        debug!(
            job_id = %update.job_id,
            lane_id = update.lane_id.0,
            status = %update.status,
            percent = update.percent,
            "{}", update.message
        );
    }

    fn on_credentials_rejected(&self, job_id: &JobId, message: &str) {
        warn!(job_id = %job_id, "Credentials rejected, a new API key is needed: {}", message);
    }
}

/// Event forwarded by [`ChannelNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierEvent {
    Progress(ProgressUpdate),
    CredentialsRejected { job_id: JobId, message: String },
}

/// Notifier that forwards events over a bounded channel.
///
/// Uses `try_send` so a slow consumer never stalls a lane; events are
/// dropped when the channel is full or closed.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<NotifierEvent>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<NotifierEvent>) -> Self {
        Self { tx }
    }

    /// Create a notifier together with its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NotifierEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl ProgressNotifier for ChannelNotifier {
    fn on_progress(&self, update: &ProgressUpdate) {
        let _ = self.tx.try_send(NotifierEvent::Progress(update.clone()));
    }

    fn on_credentials_rejected(&self, job_id: &JobId, message: &str) {
        let _ = self.tx.try_send(NotifierEvent::CredentialsRejected {
            job_id: job_id.clone(),
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veo_models::{Job, LaneId, VideoMode};

    #[test]
    fn test_channel_notifier_drops_when_full() {
        let (notifier, mut rx) = ChannelNotifier::channel(1);
        let job = Job::new(LaneId(1), 0, VideoMode::TextToVideo, "scene", Vec::new(), None);
        let update = ProgressUpdate::from_job(&job);

        notifier.on_progress(&update);
        notifier.on_progress(&update);

        assert_eq!(rx.try_recv().unwrap(), NotifierEvent::Progress(update));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_notifier_survives_closed_receiver() {
        let (notifier, rx) = ChannelNotifier::channel(4);
        drop(rx);
        notifier.on_credentials_rejected(&JobId::new(), "API key not valid");
    }
}
