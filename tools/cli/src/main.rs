//! DevTasks CLI - thin presentation layer over the sync core.
//!
//! Mutations land in the local store immediately and sync in the
//! background; the list works with or without a reachable server.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use url::Url;

use devtasks_common::{Priority, Task, TaskPatch, TaskStatus};
use devtasks_storage::{FileKv, ProjectStore};
use devtasks_sync::{HttpRemote, SyncEngine, SyncScheduler};

#[derive(Parser)]
#[command(name = "devtasks")]
#[command(about = "Offline-first task list with background sync")]
#[command(version)]
struct Cli {
    /// Remote reconciliation endpoint.
    #[arg(long, default_value = "http://127.0.0.1:8787")]
    server: Url,

    /// Data directory (defaults to the platform data dir).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task.
    Add {
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        /// "low", "medium", or "high".
        #[arg(short, long, default_value = "medium")]
        priority: String,

        /// Due date (YYYY-MM-DD).
        #[arg(long)]
        due: Option<NaiveDate>,

        #[arg(long)]
        project: Option<String>,
    },

    /// List tasks, newest-updated first.
    List,

    /// Mark a task done.
    Done { id: String },

    /// Update a task's fields.
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        /// "todo", "in_progress", or "done".
        #[arg(long)]
        status: Option<String>,

        /// "low", "medium", or "high".
        #[arg(long)]
        priority: Option<String>,
    },

    /// Delete a task.
    Delete { id: String },

    /// Flush the pending queue to the server.
    Sync,

    /// Pull the remote snapshot and merge it into local state.
    Pull,

    /// List projects.
    Projects,

    /// Run background sync on an interval until interrupted.
    Watch {
        /// Seconds between sync attempts.
        #[arg(long, default_value_t = 300)]
        interval_secs: u64,
    },
}

fn parse_priority(value: &str) -> Result<Priority> {
    match value {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        other => Err(anyhow!("unknown priority '{other}'")),
    }
}

fn parse_status(value: &str) -> Result<TaskStatus> {
    match value {
        "todo" => Ok(TaskStatus::Todo),
        "in_progress" => Ok(TaskStatus::InProgress),
        "done" => Ok(TaskStatus::Done),
        other => Err(anyhow!("unknown status '{other}'")),
    }
}

fn status_glyph(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => " ",
        TaskStatus::InProgress => "~",
        TaskStatus::Done => "x",
    }
}

fn print_task(task: &Task) {
    let project = task.project.as_deref().unwrap_or("inbox");
    println!(
        "[{}] {:<40} {:?} {} ({})",
        status_glyph(task.status),
        task.title,
        task.priority,
        project,
        task.id
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .context("No platform data directory; pass --data-dir")?
            .join("devtasks"),
    };
    let kv = Arc::new(FileKv::new(&data_dir).with_context(|| {
        format!("Failed to open data dir {}", data_dir.display())
    })?);

    let remote = Arc::new(HttpRemote::new(cli.server));
    let engine = Arc::new(SyncEngine::new(kv.clone(), remote));

    match cli.command {
        Commands::Add {
            title,
            description,
            priority,
            due,
            project,
        } => {
            let mut task = Task::new("", title);
            task.description = description;
            task.priority = parse_priority(&priority)?;
            task.due_date = due;
            task.project = project;

            let task = engine.add_task(task).await;
            print_task(&task);
        }

        Commands::List => {
            let tasks = engine.list_tasks().await;
            if tasks.is_empty() {
                println!("no tasks");
            }
            for task in &tasks {
                print_task(task);
            }
            let pending = engine.pending_operations().await;
            if pending > 0 {
                println!("({pending} operations awaiting sync)");
            }
        }

        Commands::Done { id } => {
            let patch = TaskPatch {
                status: Some(TaskStatus::Done),
                ..TaskPatch::default()
            };
            match engine.update_task(&id, patch).await {
                Some(task) => print_task(&task),
                None => println!("no task with id {id}"),
            }
        }

        Commands::Update {
            id,
            title,
            status,
            priority,
        } => {
            let patch = TaskPatch {
                title,
                status: status.as_deref().map(parse_status).transpose()?,
                priority: priority.as_deref().map(parse_priority).transpose()?,
                ..TaskPatch::default()
            };
            match engine.update_task(&id, patch).await {
                Some(task) => print_task(&task),
                None => println!("no task with id {id}"),
            }
        }

        Commands::Delete { id } => {
            engine.delete_task(&id).await;
            println!("deleted {id}");
        }

        Commands::Sync => {
            let outcome = engine.flush().await;
            println!("sync: {outcome:?}");
        }

        Commands::Pull => {
            let outcome = engine.pull().await;
            println!("pull: {outcome:?}");
        }

        Commands::Projects => {
            let projects = ProjectStore::new(kv).list().await;
            for project in &projects {
                println!("{:<12} {} ({})", project.id, project.name, project.color);
            }
        }

        Commands::Watch { interval_secs } => {
            let scheduler = SyncScheduler::spawn(engine, Duration::from_secs(interval_secs));
            println!("watching; press Ctrl-C to stop");
            tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
            scheduler.shutdown().await;
        }
    }

    Ok(())
}
