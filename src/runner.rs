use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::progress::{Progress, ProgressReporter};
use crate::storage::Storage;
use crate::tasks::{process_file, ProcessFileParams, ProcessFileResult};

/// Live state of one tracked ingestion.
#[derive(Debug, Clone, Serialize)]
pub enum TaskStatus {
    Pending,
    Running(Progress),
    Completed(ProcessFileResult),
    Failed(String),
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed(_) | TaskStatus::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskEntry {
    pub status: TaskStatus,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct TaskUpdate {
    task_id: Uuid,
    status: TaskStatus,
}

/// Channel-backed reporter wired to a [`TaskTracker`]. Updates that cannot
/// be delivered (full or closed channel) are dropped, never surfaced to the
/// pipeline.
pub struct ChannelProgress {
    task_id: Uuid,
    tx: mpsc::Sender<TaskUpdate>,
}

impl ProgressReporter for ChannelProgress {
    fn report(&self, progress: Progress) {
        let update = TaskUpdate {
            task_id: self.task_id,
            status: TaskStatus::Running(progress),
        };
        if let Err(e) = self.tx.try_send(update) {
            debug!("progress update dropped: {}", e);
        }
    }
}

/// Tracks ingestion invocations spawned onto the runtime and exposes their
/// state to external observers. The tracker owns no queueing policy: one
/// spawn is one run to completion, and retries (if any) belong to whatever
/// dispatches into it.
#[derive(Clone)]
pub struct TaskTracker {
    tasks: Arc<RwLock<HashMap<Uuid, TaskEntry>>>,
    tx: mpsc::Sender<TaskUpdate>,
    storage: Arc<dyn Storage>,
    config: IngestConfig,
}

impl TaskTracker {
    /// Create a tracker and start its state-updater loop on the current
    /// runtime.
    pub fn new(storage: Arc<dyn Storage>, config: IngestConfig) -> Self {
        let tasks: Arc<RwLock<HashMap<Uuid, TaskEntry>>> = Arc::new(RwLock::new(HashMap::new()));
        let (tx, mut rx) = mpsc::channel::<TaskUpdate>(64);

        let updater_tasks = tasks.clone();
        tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                let mut tasks = updater_tasks.write().await;
                if let Some(entry) = tasks.get_mut(&update.task_id) {
                    if update.status.is_terminal() {
                        entry.finished_at = Some(Utc::now());
                    }
                    entry.status = update.status;
                }
            }
        });

        Self {
            tasks,
            tx,
            storage,
            config,
        }
    }

    /// Spawn one ingestion and return its identifier immediately.
    pub async fn spawn(&self, params: ProcessFileParams) -> Uuid {
        let task_id = Uuid::new_v4();
        self.tasks.write().await.insert(
            task_id,
            TaskEntry {
                status: TaskStatus::Pending,
                submitted_at: Utc::now(),
                finished_at: None,
            },
        );

        let tx = self.tx.clone();
        let storage = self.storage.clone();
        let config = self.config.clone();

        tokio::spawn(async move {
            let reporter = ChannelProgress {
                task_id,
                tx: tx.clone(),
            };
            let handle = tokio::spawn(async move {
                process_file(storage, &config, params, &reporter).await
            });

            let status = match handle.await {
                Ok(result) => TaskStatus::Completed(result),
                Err(e) => {
                    warn!("ingestion task {} died: {}", task_id, e);
                    TaskStatus::Failed(format!("task aborted: {e}"))
                }
            };
            let _ = tx.send(TaskUpdate { task_id, status }).await;
        });

        task_id
    }

    pub async fn status(&self, task_id: Uuid) -> Option<TaskStatus> {
        self.tasks
            .read()
            .await
            .get(&task_id)
            .map(|entry| entry.status.clone())
    }

    pub async fn entry(&self, task_id: Uuid) -> Option<TaskEntry> {
        self.tasks.read().await.get(&task_id).cloned()
    }
}
