//! Core sync engine: CRUD entry points, flush protocol, pull path.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use devtasks_common::{Operation, Task, TaskPatch, TaskStatus};
use devtasks_storage::{KvStore, OperationQueue, TaskStore};

use crate::merge::merge;
use crate::remote::RemoteService;

/// Outcome of a flush or pull attempt.
///
/// Failures are reported here rather than as errors: the engine degrades
/// silently and retries on the next trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Queue submitted, snapshot merged, queue cleared.
    Flushed { sent: usize },
    /// Remote snapshot fetched and merged.
    Pulled { fetched: usize },
    /// Nothing pending; no network call was made.
    QueueEmpty,
    /// Another flush or pull is in flight; this trigger was dropped.
    Busy,
    /// Transport failed or the remote rejected the batch; queue and local
    /// state are untouched.
    Failed,
}

/// Orchestrates the local store, the operation queue, and the remote
/// reconciliation service.
///
/// Constructed once with an injected persistence backend and remote, then
/// shared by reference; there is no ambient global state. At most one flush
/// or pull is in flight at a time; concurrent triggers are dropped with a
/// log line.
pub struct SyncEngine {
    tasks: TaskStore,
    queue: OperationQueue,
    remote: Arc<dyn RemoteService>,
    in_flight: AtomicBool,
}

/// Releases the single-flight slot when a flush or pull completes.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncEngine {
    /// Create an engine over a shared persistence backend and remote.
    pub fn new(kv: Arc<dyn KvStore>, remote: Arc<dyn RemoteService>) -> Self {
        Self {
            tasks: TaskStore::new(kv.clone()),
            queue: OperationQueue::new(kv),
            remote,
            in_flight: AtomicBool::new(false),
        }
    }

    /// All local tasks, newest-updated first.
    pub async fn list_tasks(&self) -> Vec<Task> {
        self.tasks.list().await
    }

    /// Look up a single local task.
    pub async fn get_task(&self, id: &str) -> Option<Task> {
        self.tasks.get(id).await
    }

    /// Number of operations awaiting transmission.
    pub async fn pending_operations(&self) -> usize {
        self.queue.len().await
    }

    /// Create a task locally and queue it for the remote.
    ///
    /// A missing id is filled with a fresh UUID; `createdAt`/`updatedAt`
    /// are stamped when absent. Fires a flush attempt before returning.
    pub async fn add_task(&self, mut task: Task) -> Task {
        if task.id.is_empty() {
            task.id = Uuid::new_v4().to_string();
        }
        let now = Utc::now();
        if task.created_at.is_none() {
            task.created_at = Some(now);
        }
        if task.updated_at.is_none() {
            task.updated_at = Some(now);
        }

        self.tasks.put(task.clone()).await;
        self.queue
            .enqueue(Operation::Create { task: task.clone() })
            .await;
        self.flush().await;
        task
    }

    /// Apply a patch to a local task and queue the update.
    ///
    /// Returns `None` if the id is unknown locally. `updatedAt` is stamped
    /// monotonically; `completedAt` tracks the status crossing into or out
    /// of done unless the patch sets it explicitly.
    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> Option<Task> {
        let mut task = self.tasks.get(id).await?;
        let previous_status = task.status;

        patch.apply(&mut task);
        // Never move updatedAt backwards, even for a stale patch stamp.
        let stamp = Utc::now().max(task.updated_ts());
        task.updated_at = Some(stamp);

        if patch.completed_at.is_none() {
            if task.status == TaskStatus::Done && previous_status != TaskStatus::Done {
                task.completed_at = Some(stamp);
            } else if task.status != TaskStatus::Done {
                task.completed_at = None;
            }
        }

        self.tasks.put(task.clone()).await;
        self.queue
            .enqueue(Operation::Update {
                task_id: id.to_string(),
                updates: patch,
            })
            .await;
        self.flush().await;
        Some(task)
    }

    /// Remove a task locally and queue the delete.
    ///
    /// Without tombstones, a delete that has not reached the remote can be
    /// resurrected by a later merge if the remote still returns the id.
    pub async fn delete_task(&self, id: &str) {
        self.tasks.remove(id).await;
        self.queue
            .enqueue(Operation::Delete {
                task_id: id.to_string(),
            })
            .await;
        self.flush().await;
    }

    /// Send the queued operations to the remote and merge its snapshot.
    ///
    /// Single-flight: if a flush or pull is already running the trigger is
    /// dropped. An empty queue makes no network call. On transport failure
    /// the queue and local state stay untouched and the flush is retried on
    /// whatever trigger fires next.
    pub async fn flush(&self) -> SyncOutcome {
        let Some(_guard) = self.acquire_flight() else {
            debug!("flush already in flight, trigger dropped");
            return SyncOutcome::Busy;
        };

        let ops = self.queue.snapshot().await;
        if ops.is_empty() {
            return SyncOutcome::QueueEmpty;
        }

        let remote_tasks = match self.remote.submit(&ops).await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(
                    "flush of {} operations failed, retrying on next trigger: {e}",
                    ops.len()
                );
                return SyncOutcome::Failed;
            }
        };

        // Re-read local state: it may have moved during the round trip.
        let local = self.tasks.list().await;
        let merged = merge(local, remote_tasks);
        self.tasks.replace_all(merged).await;

        // Whole-queue clear: operations enqueued after the snapshot above
        // are dropped with it.
        self.queue.clear().await;

        info!("flushed {} operations", ops.len());
        SyncOutcome::Flushed { sent: ops.len() }
    }

    /// Fetch the remote snapshot with no outgoing queue and merge it.
    ///
    /// Shares the flush single-flight guard and the same merge policy.
    pub async fn pull(&self) -> SyncOutcome {
        let Some(_guard) = self.acquire_flight() else {
            debug!("pull skipped, sync already in flight");
            return SyncOutcome::Busy;
        };

        let remote_tasks = match self.remote.fetch().await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!("pull failed, retrying on next trigger: {e}");
                return SyncOutcome::Failed;
            }
        };

        let fetched = remote_tasks.len();
        let local = self.tasks.list().await;
        let merged = merge(local, remote_tasks);
        self.tasks.replace_all(merged).await;

        debug!("pulled {fetched} remote tasks");
        SyncOutcome::Pulled { fetched }
    }

    fn acquire_flight(&self) -> Option<FlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then(|| FlightGuard(&self.in_flight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use devtasks_common::{Error, Priority, Result};
    use devtasks_storage::MemoryKv;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Scripted remote: fails on demand, otherwise echoes a fixed snapshot.
    #[derive(Default)]
    struct MockRemote {
        fail: AtomicBool,
        snapshot: Mutex<Vec<Task>>,
        submitted: Mutex<Vec<Vec<Operation>>>,
        calls: AtomicUsize,
    }

    impl MockRemote {
        fn failing() -> Self {
            let remote = Self::default();
            remote.fail.store(true, Ordering::SeqCst);
            remote
        }

        fn with_snapshot(tasks: Vec<Task>) -> Self {
            let remote = Self::default();
            *remote.snapshot.lock().unwrap() = tasks;
            remote
        }
    }

    #[async_trait]
    impl RemoteService for MockRemote {
        async fn fetch(&self) -> Result<Vec<Task>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Network("unreachable".to_string()));
            }
            Ok(self.snapshot.lock().unwrap().clone())
        }

        async fn submit(&self, ops: &[Operation]) -> Result<Vec<Task>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Network("unreachable".to_string()));
            }
            self.submitted.lock().unwrap().push(ops.to_vec());
            Ok(self.snapshot.lock().unwrap().clone())
        }
    }

    fn engine_with(remote: Arc<MockRemote>) -> SyncEngine {
        SyncEngine::new(Arc::new(MemoryKv::new()), remote)
    }

    fn draft(title: &str) -> Task {
        Task::new("", title)
    }

    #[tokio::test]
    async fn test_empty_queue_makes_no_network_call() {
        let remote = Arc::new(MockRemote::default());
        let engine = engine_with(remote.clone());

        assert_eq!(engine.flush().await, SyncOutcome::QueueEmpty);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_add_task_fills_id_and_stamps() {
        let engine = engine_with(Arc::new(MockRemote::default()));

        let task = engine.add_task(draft("Write tests")).await;
        assert!(!task.id.is_empty());
        assert!(task.created_at.is_some());
        assert!(task.updated_at.is_some());

        let stored = engine.get_task(&task.id).await.unwrap();
        assert_eq!(stored, task);
    }

    #[tokio::test]
    async fn test_failed_flush_leaves_queue_and_store_unchanged() {
        let remote = Arc::new(MockRemote::failing());
        let engine = engine_with(remote.clone());

        // Three mutations; each flush attempt fails against the dead remote.
        let a = engine.add_task(draft("a")).await;
        engine
            .update_task(
                &a.id,
                TaskPatch {
                    priority: Some(Priority::High),
                    ..TaskPatch::default()
                },
            )
            .await;
        engine.add_task(draft("b")).await;

        let queue_before = engine.queue.snapshot().await;
        let store_before = engine.list_tasks().await;
        assert_eq!(queue_before.len(), 3);

        assert_eq!(engine.flush().await, SyncOutcome::Failed);

        assert_eq!(engine.queue.snapshot().await, queue_before);
        assert_eq!(engine.list_tasks().await, store_before);
    }

    #[tokio::test]
    async fn test_successful_flush_clears_queue_fully() {
        let remote = Arc::new(MockRemote::failing());
        let engine = engine_with(remote.clone());

        for i in 0..4 {
            engine.add_task(draft(&format!("t{i}"))).await;
        }
        assert_eq!(engine.pending_operations().await, 4);

        remote.fail.store(false, Ordering::SeqCst);
        assert_eq!(engine.flush().await, SyncOutcome::Flushed { sent: 4 });
        assert_eq!(engine.pending_operations().await, 0);

        let sent = remote.submitted.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].len(), 4);
    }

    #[tokio::test]
    async fn test_flush_merges_remote_snapshot() {
        let mut remote_task = Task::new("r1", "remote wins");
        remote_task.updated_at = Some(Utc::now() + chrono::Duration::hours(1));
        let remote = Arc::new(MockRemote::with_snapshot(vec![remote_task.clone()]));
        let engine = engine_with(remote);

        let local = engine.add_task(draft("local only")).await;

        let tasks = engine.list_tasks().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "r1");
        assert!(tasks.iter().any(|t| t.id == local.id));
    }

    #[tokio::test]
    async fn test_update_unknown_id_returns_none() {
        let engine = engine_with(Arc::new(MockRemote::default()));
        assert!(engine.update_task("nope", TaskPatch::default()).await.is_none());
    }

    #[tokio::test]
    async fn test_update_stamps_completed_at_on_done() {
        let engine = engine_with(Arc::new(MockRemote::default()));
        let task = engine.add_task(draft("finish me")).await;

        let done = engine
            .update_task(
                &task.id,
                TaskPatch {
                    status: Some(TaskStatus::Done),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();
        assert!(done.completed_at.is_some());

        let reopened = engine
            .update_task(
                &task.id,
                TaskPatch {
                    status: Some(TaskStatus::Todo),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();
        assert!(reopened.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_updated_at_is_monotonic() {
        let engine = engine_with(Arc::new(MockRemote::default()));
        let task = engine.add_task(draft("stamped")).await;

        // A patch carrying an ancient stamp must not move updatedAt back.
        let stale = TaskPatch {
            updated_at: Some(chrono::DateTime::<Utc>::MIN_UTC),
            title: Some("stale".to_string()),
            ..TaskPatch::default()
        };
        let updated = engine.update_task(&task.id, stale).await.unwrap();
        assert!(updated.updated_ts() >= task.updated_ts());
    }

    #[tokio::test]
    async fn test_delete_task_enqueues_and_removes() {
        let remote = Arc::new(MockRemote::failing());
        let engine = engine_with(remote);

        let task = engine.add_task(draft("doomed")).await;
        engine.delete_task(&task.id).await;

        assert!(engine.get_task(&task.id).await.is_none());
        let ops = engine.queue.snapshot().await;
        assert!(matches!(ops.last(), Some(Operation::Delete { task_id }) if task_id == &task.id));
    }

    /// Remote whose submit blocks until released, for overlap tests.
    struct GatedRemote {
        entered: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    impl GatedRemote {
        fn new() -> Self {
            Self {
                entered: Notify::new(),
                release: Notify::new(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RemoteService for GatedRemote {
        async fn fetch(&self) -> Result<Vec<Task>> {
            Ok(Vec::new())
        }

        async fn submit(&self, _ops: &[Operation]) -> Result<Vec<Task>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_second_flush_is_dropped_while_one_is_in_flight() {
        let remote = Arc::new(GatedRemote::new());
        let engine = Arc::new(SyncEngine::new(Arc::new(MemoryKv::new()), remote.clone()));

        // Seed the queue without triggering a flush through the CRUD path.
        engine
            .queue
            .enqueue(Operation::Delete {
                task_id: "t1".to_string(),
            })
            .await;

        let background = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.flush().await })
        };
        remote.entered.notified().await;

        assert_eq!(engine.flush().await, SyncOutcome::Busy);
        assert_eq!(engine.pull().await, SyncOutcome::Busy);

        remote.release.notify_one();
        assert_eq!(background.await.unwrap(), SyncOutcome::Flushed { sent: 1 });
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mid_flight_enqueue_is_dropped_by_clear() {
        let remote = Arc::new(GatedRemote::new());
        let engine = Arc::new(SyncEngine::new(Arc::new(MemoryKv::new()), remote.clone()));

        engine
            .queue
            .enqueue(Operation::Delete {
                task_id: "t1".to_string(),
            })
            .await;

        let background = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.flush().await })
        };
        remote.entered.notified().await;

        // Lands after the flush snapshot was taken; the unconditional clear
        // wipes it along with the sent entry.
        engine
            .queue
            .enqueue(Operation::Delete {
                task_id: "t2".to_string(),
            })
            .await;
        assert_eq!(engine.pending_operations().await, 2);

        remote.release.notify_one();
        assert_eq!(background.await.unwrap(), SyncOutcome::Flushed { sent: 1 });
        assert_eq!(engine.pending_operations().await, 0);
    }
}
