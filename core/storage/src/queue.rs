//! Durable FIFO of pending operations awaiting transmission.

use std::sync::Arc;
use tracing::warn;

use crate::kv::{slots, KvStore};
use devtasks_common::Operation;

/// Append-only operation queue, durable across restarts.
///
/// Entries leave the queue only through [`clear`](OperationQueue::clear),
/// which wipes it entirely and must be called only after a confirmed
/// successful flush. Operations enqueued after a flush snapshot was taken
/// but before the clear are dropped with it; callers relying on the queue
/// must tolerate that window.
pub struct OperationQueue {
    kv: Arc<dyn KvStore>,
}

impl OperationQueue {
    /// Create a queue over the given backend.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Append an operation; persisted before this returns.
    pub async fn enqueue(&self, op: Operation) {
        let mut ops = self.load().await;
        ops.push(op);
        let raw = match serde_json::to_string(&ops) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to serialize sync queue: {e}");
                return;
            }
        };
        if let Err(e) = self.kv.set(slots::SYNC_QUEUE, raw).await {
            warn!("failed to persist sync queue: {e}");
        }
    }

    /// The full ordered queue, without removing entries.
    pub async fn snapshot(&self) -> Vec<Operation> {
        self.load().await
    }

    /// Number of pending operations.
    pub async fn len(&self) -> usize {
        self.load().await.len()
    }

    /// Whether the queue holds no operations.
    pub async fn is_empty(&self) -> bool {
        self.load().await.is_empty()
    }

    /// Empty the queue entirely.
    ///
    /// Invoked only after a confirmed successful flush response, never
    /// speculatively before sending.
    pub async fn clear(&self) {
        if let Err(e) = self.kv.remove(slots::SYNC_QUEUE).await {
            warn!("failed to clear sync queue: {e}");
        }
    }

    async fn load(&self) -> Vec<Operation> {
        match self.kv.get(slots::SYNC_QUEUE).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(ops) => ops,
                Err(e) => {
                    warn!("sync queue slot is unreadable, treating as empty: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("failed to read sync queue: {e}");
                Vec::new()
            }
        }
    }
}
