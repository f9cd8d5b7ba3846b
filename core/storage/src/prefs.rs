//! Onboarding flag and settings blob.

use std::sync::Arc;
use tracing::warn;

use crate::kv::{slots, KvStore};

/// Small durable preferences: the onboarding-completed flag and an opaque
/// settings blob owned by the presentation layer. Same fail-open contract
/// as the task store.
pub struct Preferences {
    kv: Arc<dyn KvStore>,
}

impl Preferences {
    /// Create preferences over the given backend.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Whether onboarding has been completed.
    pub async fn onboarding_complete(&self) -> bool {
        match self.kv.get(slots::ONBOARDING).await {
            Ok(Some(raw)) => raw == "true",
            Ok(None) => false,
            Err(e) => {
                warn!("failed to read onboarding flag: {e}");
                false
            }
        }
    }

    /// Mark onboarding as completed.
    pub async fn set_onboarding_complete(&self) {
        if let Err(e) = self.kv.set(slots::ONBOARDING, "true".to_string()).await {
            warn!("failed to save onboarding flag: {e}");
        }
    }

    /// The settings blob, if one has been saved.
    pub async fn settings(&self) -> Option<serde_json::Value> {
        match self.kv.get(slots::SETTINGS).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("settings slot is unreadable: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("failed to read settings: {e}");
                None
            }
        }
    }

    /// Replace the settings blob.
    pub async fn save_settings(&self, settings: &serde_json::Value) {
        if let Err(e) = self.kv.set(slots::SETTINGS, settings.to_string()).await {
            warn!("failed to save settings: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKv;

    #[tokio::test]
    async fn test_onboarding_flag() {
        let prefs = Preferences::new(Arc::new(MemoryKv::new()));
        assert!(!prefs.onboarding_complete().await);

        prefs.set_onboarding_complete().await;
        assert!(prefs.onboarding_complete().await);
    }

    #[tokio::test]
    async fn test_settings_blob_roundtrip() {
        let prefs = Preferences::new(Arc::new(MemoryKv::new()));
        assert!(prefs.settings().await.is_none());

        let value = serde_json::json!({ "theme": "dark" });
        prefs.save_settings(&value).await;
        assert_eq!(prefs.settings().await, Some(value));
    }
}
