//! CLI binary for nudge.

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use nudge::notify::LogNotifier;
use nudge::reminders::{SharedQuietWindow, TokioWakeAlarm, next_reminder};
use nudge::store::{MemoryTaskStore, TaskStore};
use nudge::time::{now_epoch_millis, to_datetime};
use nudge::{NudgeConfig, ReminderService};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Nudge: reminder scheduling for a personal task manager.
#[derive(Parser)]
#[command(name = "nudge", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Show the next reminder of every task without firing anything.
    Plan {
        /// JSON task file.
        #[arg(short, long)]
        tasks: PathBuf,

        /// Evaluate at this RFC 3339 instant instead of now.
        #[arg(long)]
        at: Option<String>,
    },

    /// Fire reminders as they come due until interrupted.
    Run {
        /// JSON task file.
        #[arg(short, long)]
        tasks: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nudge=info")),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(NudgeConfig::default_config_path);
    let config = NudgeConfig::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match cli.command {
        Command::Plan { tasks, at } => plan(&config, &tasks, at.as_deref()),
        Command::Run { tasks } => run(&config, &tasks).await,
    }
}

fn load_store(config: &NudgeConfig, tasks: &Path) -> anyhow::Result<MemoryTaskStore> {
    let defaults = config.reminder_defaults()?;
    MemoryTaskStore::from_json_file(tasks, &defaults)
        .with_context(|| format!("loading tasks from {}", tasks.display()))
}

fn plan(config: &NudgeConfig, tasks: &Path, at: Option<&str>) -> anyhow::Result<()> {
    let now = match at {
        Some(s) => {
            let parsed = DateTime::parse_from_rfc3339(s).with_context(|| format!("--at {s}"))?;
            nudge::time::to_epoch_millis(&parsed)
        }
        None => now_epoch_millis(),
    };
    let window = config.quiet_window()?;
    let store = load_store(config, tasks)?;

    let mut jobs: Vec<_> = store
        .active_reminders()?
        .iter()
        .filter_map(|task| next_reminder(task, now, &window, &Local))
        .collect();
    jobs.sort_by_key(|job| job.trigger_time);

    if jobs.is_empty() {
        println!("No reminders scheduled.");
        return Ok(());
    }
    for job in &jobs {
        println!(
            "{:>8}  {:<8}  {}",
            job.id.0,
            job.kind.as_str(),
            format_local(job.trigger_time)
        );
    }
    Ok(())
}

async fn run(config: &NudgeConfig, tasks: &Path) -> anyhow::Result<()> {
    let window = SharedQuietWindow::new(config.quiet_window()?);
    let store = load_store(config, tasks)?;
    let (alarm, mut wake_rx) = TokioWakeAlarm::channel()?;
    let service = ReminderService::new(store, alarm, LogNotifier, window);

    let queued = service.rebuild(now_epoch_millis())?;
    match service.next_wake() {
        Some(at) => info!(queued, next = %format_local(at), "nudge running"),
        None => info!(queued, "nudge running, nothing to remind"),
    }

    loop {
        tokio::select! {
            Some(at) = wake_rx.recv() => {
                // Wall clock may lag the timer slightly.
                let now = now_epoch_millis().max(at);
                if let Err(e) = service.on_wake(now) {
                    warn!("failed to reprogram alarm: {e}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }
    Ok(())
}

fn format_local(millis: u64) -> String {
    to_datetime(millis, &Local)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S %Z").to_string())
        .unwrap_or_else(|| millis.to_string())
}
