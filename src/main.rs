//! # taskfirst - task workspace with output analytics
//!
//! A command-line task workspace where every top-level task can carry one
//! level of subtasks, plus an optional terminal user interface (TUI).
//!
//! ## Key Features
//!
//! - **Task spreadsheet**: tasks and subtasks with status, priority, assignee,
//!   team, deadline, estimate and logged effort
//! - **Handoff**: finishing an item stamps its completion time and records the
//!   handoff note, output link and hours spent
//! - **Insights**: stat cards, early / on-time / late delivery, per-department
//!   and per-assignee output, and four headline metrics
//! - **Archive**: searchable list of finished work
//!
//! ## Quick Start
//!
//! ```bash
//! # Try it on the demo workspace without touching disk
//! tf --mock dashboard
//!
//! # Add a task and a subtask
//! tf add "Landing page copy" --team Content --estimate 6
//! tf add-sub t1 "Hero headline" --deadline friday
//!
//! # Hand off finished work
//! tf handoff s1 --comment "Approved by marketing" --hours 2 --minutes 30
//!
//! # Machine-readable analytics
//! tf dashboard --json
//! ```
//!
//! Data is stored in `~/.taskfirst/workspace.json` unless `--db` or
//! `TASKFIRST_DB` points elsewhere.

use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod db;
pub mod error;
pub mod fields;
pub mod store;
pub mod task;
pub mod metrics {
    pub mod grouping;
    pub mod items;
    pub mod status;
    pub mod summary;
    pub mod timing;
}
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod views;
}

use cli::Cli;
use cmd::*;
use db::local_today;
use error::Result;
use store::{FileStore, MemoryStore, TaskStore};

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "taskfirst=debug,info"
    } else {
        "taskfirst=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `$HOME/.taskfirst/workspace.json`, or `./.taskfirst/workspace.json` without a home.
fn default_db_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".taskfirst").join("workspace.json")
}

fn main() {
    let cli = Cli::parse();

    // The TUI owns the terminal; log lines would corrupt the screen.
    if !matches!(cli.command, Commands::Ui) {
        init_logging(cli.verbose);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return Ok(());
    }

    let mut store: Box<dyn TaskStore> = if cli.mock {
        tracing::debug!("using in-memory demo workspace");
        Box::new(MemoryStore::demo(local_today(), Utc::now()))
    } else {
        let path = cli.db.unwrap_or_else(default_db_path);
        Box::new(FileStore::open(&path)?)
    };
    let store = store.as_mut();
    let actor = cli.acting_user.as_str();

    match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled above"),

        Commands::Ui => cmd_ui(store, actor),

        Commands::Add { title, project, fields } => cmd_add(store, actor, title, project, fields),

        Commands::AddSub { task, title, fields } => cmd_add_sub(store, actor, task, title, fields),

        Commands::Update { id, fields } => cmd_update(store, id, fields),

        Commands::Handoff { id, comment, link, hours, minutes } =>
            cmd_handoff(store, id, comment, link, hours, minutes),

        Commands::Delete { id } => cmd_delete(store, id),

        Commands::List { status, expand } => cmd_list(store, status, expand),

        Commands::Stats => cmd_stats(store),

        Commands::Dashboard { json } => cmd_dashboard(store, json),

        Commands::Archive { search } => cmd_archive(store, search),

        Commands::Projects => cmd_projects(store),

        Commands::Project { action } => cmd_project(store, action),

        Commands::Users => cmd_users(store),

        Commands::Seed => cmd_seed(store),
    }
}
