//! Generation history sinks.
//!
//! Each succeeded job is handed to the sink exactly once. The history
//! outlives the run that produced it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use veo_models::HistoryEntry;

use crate::error::OrchestratorResult;

/// Caller-owned, append-only store of finished generations.
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn on_job_succeeded(&self, entry: HistoryEntry);
}

/// History kept in memory, newest last.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl HistorySink for InMemoryHistory {
    async fn on_job_succeeded(&self, entry: HistoryEntry) {
        self.entries.write().await.push(entry);
    }
}

/// History appended to a JSON Lines file, one entry per line.
#[derive(Debug)]
pub struct JsonlHistory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entry: &HistoryEntry) -> OrchestratorResult<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Read all entries back, skipping lines that fail to parse.
    pub async fn load(&self) -> OrchestratorResult<Vec<HistoryEntry>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

#[async_trait]
impl HistorySink for JsonlHistory {
    async fn on_job_succeeded(&self, entry: HistoryEntry) {
        if let Err(e) = self.append(&entry).await {
            warn!(job_id = %entry.id, path = %self.path.display(), "Failed to persist history entry: {}", e);
        }
    }
}
