//! Durable key/value slot contract.

use async_trait::async_trait;

use devtasks_common::Result;

/// Well-known slot names.
pub mod slots {
    /// Local task collection.
    pub const TASKS: &str = "tasks";
    /// Project list.
    pub const PROJECTS: &str = "projects";
    /// Pending-operation queue.
    pub const SYNC_QUEUE: &str = "sync_queue";
    /// Onboarding-completed flag.
    pub const ONBOARDING: &str = "onboarding_complete";
    /// Opaque settings blob.
    pub const SETTINGS: &str = "settings";
}

/// Durable key/value store for named slots.
///
/// Values are opaque strings (JSON blobs in practice). Implementations must
/// make `set` atomic with respect to readers: a `get` never observes a
/// partially-written value.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get the backend name (e.g. "file", "memory").
    fn name(&self) -> &str;

    /// Read a slot. Returns `None` if the slot has never been written.
    async fn get(&self, slot: &str) -> Result<Option<String>>;

    /// Write a slot, replacing any previous value.
    async fn set(&self, slot: &str, value: String) -> Result<()>;

    /// Delete a slot. Removing an absent slot is not an error.
    async fn remove(&self, slot: &str) -> Result<()>;
}
