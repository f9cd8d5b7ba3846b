//! Project list persistence.

use std::sync::Arc;
use tracing::warn;

use crate::kv::{slots, KvStore};
use devtasks_common::Project;

/// Durable project list. Falls back to the built-in defaults when the slot
/// is empty or unreadable.
pub struct ProjectStore {
    kv: Arc<dyn KvStore>,
}

impl ProjectStore {
    /// Create a store over the given backend.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// All projects, defaults when none have been saved.
    pub async fn list(&self) -> Vec<Project> {
        match self.kv.get(slots::PROJECTS).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(projects) => projects,
                Err(e) => {
                    warn!("projects slot is unreadable, serving defaults: {e}");
                    Project::defaults()
                }
            },
            Ok(None) => Project::defaults(),
            Err(e) => {
                warn!("failed to read projects: {e}");
                Project::defaults()
            }
        }
    }

    /// Replace the saved project list.
    pub async fn save(&self, projects: &[Project]) {
        let raw = match serde_json::to_string(projects) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to serialize projects: {e}");
                return;
            }
        };
        if let Err(e) = self.kv.set(slots::PROJECTS, raw).await {
            warn!("failed to save projects: {e}");
        }
    }
}
