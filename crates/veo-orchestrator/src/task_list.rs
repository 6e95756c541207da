//! Aggregate, observable list of every job in a run.
//!
//! This is the only state shared between lanes. Each lane writes only its
//! own jobs, so last-write-wins per job ID never loses an update. Jobs are
//! kept newest first.

use std::sync::Arc;

use tokio::sync::watch;

use veo_models::{Job, JobId, JobStatus, LaneId};

#[derive(Debug, Clone)]
pub struct TaskList {
    tx: Arc<watch::Sender<Vec<Job>>>,
}

impl TaskList {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self { tx: Arc::new(tx) }
    }

    /// Insert a job, or replace the stored snapshot with the same ID.
    pub fn upsert(&self, job: Job) {
        self.tx.send_modify(|jobs| {
            if let Some(existing) = jobs.iter_mut().find(|j| j.id == job.id) {
                *existing = job;
            } else {
                let pos = jobs
                    .iter()
                    .position(|j| j.created_at <= job.created_at)
                    .unwrap_or(jobs.len());
                jobs.insert(pos, job);
            }
        });
    }

    /// Current jobs, newest first.
    pub fn snapshot(&self) -> Vec<Job> {
        self.tx.borrow().clone()
    }

    /// Jobs of one lane, newest first.
    pub fn for_lane(&self, lane_id: LaneId) -> Vec<Job> {
        self.tx
            .borrow()
            .iter()
            .filter(|j| j.lane_id == lane_id)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.tx.borrow().iter().find(|j| &j.id == id).cloned()
    }

    /// Most recently created job.
    pub fn latest(&self) -> Option<Job> {
        self.tx.borrow().first().cloned()
    }

    pub fn count_with_status(&self, status: JobStatus) -> usize {
        self.tx.borrow().iter().filter(|j| j.status == status).count()
    }

    /// Number of jobs with a provider call in flight.
    pub fn active_count(&self) -> usize {
        self.tx.borrow().iter().filter(|j| j.status.is_active()).count()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Watch the list; the receiver is notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Job>> {
        self.tx.subscribe()
    }
}

impl Default for TaskList {
    fn default() -> Self {
        Self::new()
    }
}
