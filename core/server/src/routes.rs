//! HTTP surface for the reconciliation service.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use devtasks_common::{Result, SyncBatch, TasksPayload};

use crate::store::ReconcileStore;

/// Build the service router.
pub fn build_router(store: Arc<ReconcileStore>) -> Router {
    Router::new()
        .route("/api/tasks", get(list_tasks))
        .route("/api/sync", post(sync_batch))
        .with_state(store)
}

/// Bind and serve until the process exits.
pub async fn serve(addr: SocketAddr, store: Arc<ReconcileStore>) -> Result<()> {
    let router = build_router(store);
    info!("reconciliation service listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

/// `GET /api/tasks`
async fn list_tasks(State(store): State<Arc<ReconcileStore>>) -> Json<TasksPayload> {
    Json(TasksPayload {
        tasks: store.snapshot().await,
    })
}

/// `POST /api/sync`
async fn sync_batch(
    State(store): State<Arc<ReconcileStore>>,
    Json(batch): Json<SyncBatch>,
) -> Json<TasksPayload> {
    Json(TasksPayload {
        tasks: store.apply_batch(batch.ops).await,
    })
}
