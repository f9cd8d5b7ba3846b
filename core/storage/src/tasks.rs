//! Local task store: the sole source of truth for offline reads.

use std::sync::Arc;
use tracing::warn;

use crate::kv::{slots, KvStore};
use devtasks_common::{sort_newest_first, Task};

/// Durable task collection keyed by task id.
///
/// Fail-open: read and write failures are logged and degrade to an empty
/// collection / no-op. Availability of the UI read path outranks durability
/// here, so no method returns an error.
pub struct TaskStore {
    kv: Arc<dyn KvStore>,
}

impl TaskStore {
    /// Create a store over the given backend.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// All tasks, newest-updated first.
    pub async fn list(&self) -> Vec<Task> {
        let mut tasks = self.load().await;
        sort_newest_first(&mut tasks);
        tasks
    }

    /// Look up a single task by id.
    pub async fn get(&self, id: &str) -> Option<Task> {
        self.load().await.into_iter().find(|t| t.id == id)
    }

    /// Insert or replace a task.
    pub async fn put(&self, task: Task) {
        let mut tasks = self.load().await;
        if let Some(existing) = tasks.iter_mut().find(|t| t.id == task.id) {
            *existing = task;
        } else {
            tasks.push(task);
        }
        self.persist(tasks).await;
    }

    /// Remove a task. Removing an absent id is a no-op.
    pub async fn remove(&self, id: &str) {
        let mut tasks = self.load().await;
        tasks.retain(|t| t.id != id);
        self.persist(tasks).await;
    }

    /// Replace the whole collection, e.g. with a merge result.
    pub async fn replace_all(&self, tasks: Vec<Task>) {
        self.persist(tasks).await;
    }

    async fn load(&self) -> Vec<Task> {
        match self.kv.get(slots::TASKS).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(tasks) => tasks,
                Err(e) => {
                    warn!("tasks slot is unreadable, treating as empty: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("failed to read tasks: {e}");
                Vec::new()
            }
        }
    }

    async fn persist(&self, mut tasks: Vec<Task>) {
        sort_newest_first(&mut tasks);
        let raw = match serde_json::to_string(&tasks) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to serialize tasks: {e}");
                return;
            }
        };
        if let Err(e) = self.kv.set(slots::TASKS, raw).await {
            warn!("failed to save tasks: {e}");
        }
    }
}
