//! In-memory key/value store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::kv::KvStore;
use devtasks_common::Result;

/// In-memory key/value store.
///
/// Useful for tests and the in-memory reconciliation service. All data is
/// lost on drop.
#[derive(Default)]
pub struct MemoryKv {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, slot: &str) -> Result<Option<String>> {
        Ok(self.slots.read().unwrap().get(slot).cloned())
    }

    async fn set(&self, slot: &str, value: String) -> Result<()> {
        self.slots.write().unwrap().insert(slot.to_string(), value);
        Ok(())
    }

    async fn remove(&self, slot: &str) -> Result<()> {
        self.slots.write().unwrap().remove(slot);
        Ok(())
    }
}
