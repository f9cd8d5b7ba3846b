//! Client view of the remote reconciliation service.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use devtasks_common::{Error, Operation, Result, SyncBatch, Task, TasksPayload};

/// Remote reconciliation endpoint.
///
/// Implementations must treat any non-success response as an error so the
/// engine keeps its queue intact and retries on the next trigger.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Fetch the full current snapshot (`GET /api/tasks`).
    async fn fetch(&self) -> Result<Vec<Task>>;

    /// Apply a batch of operations and return the full post-apply snapshot
    /// (`POST /api/sync`).
    async fn submit(&self, ops: &[Operation]) -> Result<Vec<Task>>;
}

/// HTTP client for the reconciliation service.
pub struct HttpRemote {
    base: Url,
    http: Client,
}

impl HttpRemote {
    /// Create a client for the service at `base`.
    pub fn new(base: Url) -> Self {
        let http = Client::builder()
            .user_agent("DevTasks/0.1")
            .build()
            .expect("Failed to create HTTP client");

        Self { base, http }
    }

    /// Append path segments to the base URL, keeping any base path prefix
    /// whether or not it carries a trailing slash.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::InvalidInput(format!("Base URL {} cannot carry a path", self.base))
            })?
            .pop_if_empty()
            .extend(path.split('/'));
        Ok(url)
    }
}

#[async_trait]
impl RemoteService for HttpRemote {
    async fn fetch(&self) -> Result<Vec<Task>> {
        let url = self.endpoint("api/tasks")?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to fetch tasks: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "Remote returned {}",
                response.status()
            )));
        }

        let payload: TasksPayload = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Malformed tasks payload: {e}")))?;

        Ok(payload.tasks)
    }

    async fn submit(&self, ops: &[Operation]) -> Result<Vec<Task>> {
        let url = self.endpoint("api/sync")?;
        let batch = SyncBatch { ops: ops.to_vec() };

        let response = self
            .http
            .post(url)
            .json(&batch)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to submit operations: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "Remote returned {}",
                response.status()
            )));
        }

        let payload: TasksPayload = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Malformed sync response: {e}")))?;

        Ok(payload.tasks)
    }
}
