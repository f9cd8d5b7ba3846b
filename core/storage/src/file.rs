//! File-backed key/value store.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::kv::KvStore;
use devtasks_common::{Error, Result};

/// File-backed store: one file per slot under a root directory.
///
/// Writes go to a temp file first and are renamed into place, so a reader
/// never observes a partially-written slot.
pub struct FileKv {
    root: PathBuf,
}

impl FileKv {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.root.join(format!("{slot}.json"))
    }
}

#[async_trait]
impl KvStore for FileKv {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, slot: &str) -> Result<Option<String>> {
        let path = self.slot_path(slot);
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    async fn set(&self, slot: &str, value: String) -> Result<()> {
        let path = self.slot_path(slot);
        let tmp = self.root.join(format!("{slot}.json.tmp"));
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, slot: &str) -> Result<()> {
        let path = self.slot_path(slot);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}
