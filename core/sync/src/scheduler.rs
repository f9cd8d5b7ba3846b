//! Background sync scheduling: startup, interval, and foreground triggers.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::{SyncEngine, SyncOutcome};

/// Trigger sources feeding the scheduler.
#[derive(Debug)]
enum SyncTrigger {
    /// App moved to the foreground.
    Foreground,
    /// Stop the background task.
    Shutdown,
}

/// Drives the engine from a background task.
///
/// Startup triggers a flush followed by a pull; the fixed interval and
/// foreground transitions trigger a flush, falling back to a pull when the
/// queue is empty. Overlap between triggers is resolved by the engine's
/// single-flight guard, not here.
pub struct SyncScheduler {
    tx: mpsc::Sender<SyncTrigger>,
    task: JoinHandle<()>,
}

impl SyncScheduler {
    /// Spawn the scheduler over a shared engine.
    pub fn spawn(engine: Arc<SyncEngine>, every: Duration) -> Self {
        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(run_loop(engine, every, rx));
        Self { tx, task }
    }

    /// Report an app-foreground transition.
    pub async fn notify_foreground(&self) {
        if self.tx.send(SyncTrigger::Foreground).await.is_err() {
            warn!("scheduler is not running, foreground trigger dropped");
        }
    }

    /// Stop the background task and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.tx.send(SyncTrigger::Shutdown).await;
        let _ = self.task.await;
    }
}

async fn run_loop(engine: Arc<SyncEngine>, every: Duration, mut rx: mpsc::Receiver<SyncTrigger>) {
    info!("sync scheduler started");

    // Startup: drain whatever queued up offline, then reconcile.
    let outcome = engine.flush().await;
    debug!("startup trigger: flush -> {outcome:?}");
    let outcome = engine.pull().await;
    debug!("startup trigger: pull -> {outcome:?}");

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sync_once(&engine, "interval").await;
            }
            trigger = rx.recv() => match trigger {
                Some(SyncTrigger::Foreground) => {
                    sync_once(&engine, "foreground").await;
                }
                Some(SyncTrigger::Shutdown) | None => {
                    info!("sync scheduler shutting down");
                    break;
                }
            }
        }
    }
}

/// Flush pending operations; with nothing queued, pull instead.
async fn sync_once(engine: &SyncEngine, trigger: &str) {
    match engine.flush().await {
        SyncOutcome::QueueEmpty => {
            let outcome = engine.pull().await;
            debug!("{trigger} trigger: queue empty, pull -> {outcome:?}");
        }
        outcome => {
            debug!("{trigger} trigger: flush -> {outcome:?}");
        }
    }
}
