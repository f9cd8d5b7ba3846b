//! Authoritative task store with batch apply semantics.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use devtasks_common::{Error, Operation, Result, Task};
use devtasks_storage::{slots, KvStore};

/// Authoritative map of id to task.
///
/// Batches are applied in submission order, so later operations touching
/// the same id override earlier ones. A malformed operation is skipped with
/// a log line and never aborts the rest of its batch.
pub struct ReconcileStore {
    tasks: RwLock<HashMap<String, Task>>,
    backing: Option<Arc<dyn KvStore>>,
}

impl ReconcileStore {
    /// Create a store scoped to the service lifetime.
    pub fn in_memory() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            backing: None,
        }
    }

    /// Create a store over a durable backend, loading any saved snapshot.
    pub async fn with_backing(kv: Arc<dyn KvStore>) -> Self {
        let tasks = match kv.get(slots::TASKS).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Task>>(&raw) {
                Ok(tasks) => tasks.into_iter().map(|t| (t.id.clone(), t)).collect(),
                Err(e) => {
                    warn!("saved snapshot is unreadable, starting empty: {e}");
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!("failed to load saved snapshot, starting empty: {e}");
                HashMap::new()
            }
        };

        Self {
            tasks: RwLock::new(tasks),
            backing: Some(kv),
        }
    }

    /// Full current record set.
    pub async fn snapshot(&self) -> Vec<Task> {
        self.tasks.read().await.values().cloned().collect()
    }

    /// Apply a batch in submission order and return the full snapshot.
    pub async fn apply_batch(&self, ops: Vec<Operation>) -> Vec<Task> {
        {
            let mut tasks = self.tasks.write().await;
            for op in ops {
                if let Err(e) = Self::apply_one(&mut tasks, op) {
                    warn!("skipping operation: {e}");
                }
            }
        }
        self.persist().await;
        self.snapshot().await
    }

    fn apply_one(tasks: &mut HashMap<String, Task>, op: Operation) -> Result<()> {
        match op {
            Operation::Create { mut task } => {
                if task.id.is_empty() {
                    return Err(Error::InvalidInput("create without a task id".to_string()));
                }
                let now = Utc::now();
                if task.created_at.is_none() {
                    task.created_at = Some(now);
                }
                if task.updated_at.is_none() {
                    task.updated_at = Some(now);
                }
                tasks.insert(task.id.clone(), task);
            }
            Operation::Update { task_id, updates } => {
                // Unknown id is a no-op, not an error.
                if let Some(task) = tasks.get_mut(&task_id) {
                    updates.apply(task);
                    task.updated_at = Some(Utc::now());
                }
            }
            Operation::Delete { task_id } => {
                // Idempotent: deleting an absent id is fine.
                tasks.remove(&task_id);
            }
        }
        Ok(())
    }

    /// Best-effort save to the backing store, if any.
    async fn persist(&self) {
        let Some(kv) = &self.backing else {
            return;
        };
        let snapshot: Vec<Task> = self.tasks.read().await.values().cloned().collect();
        let raw = match serde_json::to_string(&snapshot) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to serialize snapshot: {e}");
                return;
            }
        };
        if let Err(e) = kv.set(slots::TASKS, raw).await {
            warn!("failed to persist snapshot: {e}");
        }
    }
}
