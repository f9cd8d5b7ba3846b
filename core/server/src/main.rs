//! DevTasks reconciliation server binary.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use devtasks_server::{serve, ReconcileStore};
use devtasks_storage::FileKv;

#[derive(Parser)]
#[command(name = "devtasks-server")]
#[command(about = "DevTasks remote reconciliation service")]
#[command(version)]
struct Cli {
    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:8787")]
    bind: SocketAddr,

    /// Durable data directory; the store is in-memory when omitted.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let store = match &cli.data_dir {
        Some(dir) => {
            let kv = Arc::new(
                FileKv::new(dir)
                    .with_context(|| format!("Failed to open data dir {}", dir.display()))?,
            );
            Arc::new(ReconcileStore::with_backing(kv).await)
        }
        None => Arc::new(ReconcileStore::in_memory()),
    };

    serve(cli.bind, store).await.context("Server failed")?;
    Ok(())
}
