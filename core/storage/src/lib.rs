//! DevTasks local persistence.
//!
//! Everything here sits on a single durable key/value contract: named slots
//! holding opaque JSON blobs. The task store, the pending-operation queue,
//! projects, and preferences are all views over that contract, so any
//! [`KvStore`] backend can carry the full application state.

pub mod file;
pub mod kv;
pub mod memory;
pub mod prefs;
pub mod projects;
pub mod queue;
pub mod tasks;

pub use file::FileKv;
pub use kv::{slots, KvStore};
pub use memory::MemoryKv;
pub use prefs::Preferences;
pub use projects::ProjectStore;
pub use queue::OperationQueue;
pub use tasks::TaskStore;
