//! Common types shared across DevTasks modules.
//!
//! This module provides the task data model, the operation wire format,
//! and the error type used throughout the codebase.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    sort_newest_first, Operation, Priority, Project, SyncBatch, Task, TaskPatch, TaskStatus,
    TasksPayload,
};
