//! DevTasks Sync Engine
//!
//! This module reconciles offline task mutations with the remote
//! authoritative service:
//! - Durable operation queue flushed as a single batch
//! - Last-writer-wins merge shared by the flush and pull paths
//! - Single-flight guard coalescing concurrent triggers
//! - Background scheduling for startup, interval, and foreground triggers

pub mod engine;
pub mod merge;
pub mod remote;
pub mod scheduler;

// Re-export main types
pub use engine::{SyncEngine, SyncOutcome};
pub use merge::merge;
pub use remote::{HttpRemote, RemoteService};
pub use scheduler::SyncScheduler;
