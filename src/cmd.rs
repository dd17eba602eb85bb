//! Command implementations for the CLI interface.
//!
//! Every handler works against a [`TaskStore`], prints its result to stdout
//! and returns errors to `main`, which reports them and exits non-zero.

use clap::{Args, Subcommand};
use clap_complete::{generate, Shell};

use chrono::Utc;
use tracing::debug;

use crate::db::*;
use crate::error::{Result, TaskFirstError};
use crate::fields::*;
use crate::metrics::items::archive;
use crate::metrics::status::{filter_top_level, stat_cards};
use crate::metrics::summary::Dashboard;
use crate::store::*;
use crate::task::{Handoff, ItemUpdate, Task, User, WorkItem};
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI interface.
    Ui,

    /// Add a new top-level task.
    Add {
        /// Short title for the task.
        title: String,
        /// Project id (defaults to the first project).
        #[arg(long)]
        project: Option<String>,
        #[command(flatten)]
        fields: ItemFields,
    },

    /// Add a subtask to an existing task.
    AddSub {
        /// Id of the parent task.
        task: String,
        /// Short title for the subtask.
        title: String,
        #[command(flatten)]
        fields: ItemFields,
    },

    /// Update fields on a task or subtask.
    Update {
        /// Task or subtask id.
        id: String,
        #[command(flatten)]
        fields: UpdateFields,
    },

    /// Finish a task or subtask and hand over the deliverable.
    Handoff {
        /// Task or subtask id.
        id: String,
        /// Handoff note for the reviewer.
        #[arg(long)]
        comment: Option<String>,
        /// Link to the delivered output.
        #[arg(long)]
        link: Option<String>,
        /// Hours spent.
        #[arg(long)]
        hours: Option<u32>,
        /// Minutes spent on top of the hours.
        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Delete a task with its subtasks, or a single subtask.
    Delete {
        /// Task or subtask id.
        id: String,
    },

    /// List tasks in spreadsheet form.
    List {
        /// Keep tasks where the task or one of its subtasks has this status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Show subtasks under their parent task.
        #[arg(long)]
        expand: bool,
    },

    /// Show the five stat cards.
    Stats,

    /// Show output analytics for the whole workspace.
    Dashboard {
        /// Print the dashboard as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List finished work.
    Archive {
        /// Only show items whose title or handoff comment contains this text.
        #[arg(long)]
        search: Option<String>,
    },

    /// List projects with their task counts.
    Projects,

    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// List registered users.
    Users,

    /// Fill an empty workspace with demo data.
    Seed,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Register a new project.
    Add {
        /// Project name.
        name: String,
    },
    /// Remove a project by id.
    Delete {
        /// Project id.
        id: String,
    },
}

/// Optional fields shared by `add` and `add-sub`.
#[derive(Args, Debug, Default)]
pub struct ItemFields {
    /// Optional longer description.
    #[arg(long)]
    pub desc: Option<String>,
    /// Assignee user id (defaults to the acting user).
    #[arg(long)]
    pub assignee: Option<String>,
    /// Team (department).
    #[arg(long)]
    pub team: Option<String>,
    /// Task type (defaults to the first registered type).
    #[arg(long = "type")]
    pub task_type: Option<String>,
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
    /// Deadline: YYYY-MM-DD, "today", "friday", "in 3d", ...
    #[arg(long)]
    pub deadline: Option<String>,
    /// Estimated hours.
    #[arg(long)]
    pub estimate: Option<f64>,
}

/// Field edits accepted by `update`.
#[derive(Args, Debug, Default)]
pub struct UpdateFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub desc: Option<String>,
    /// New status. Use `handoff` to finish an item.
    #[arg(long, value_enum)]
    pub status: Option<Status>,
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
    /// Assignee user id.
    #[arg(long)]
    pub assignee: Option<String>,
    /// Team (department).
    #[arg(long)]
    pub team: Option<String>,
    /// Task type.
    #[arg(long = "type")]
    pub task_type: Option<String>,
    /// Deadline: YYYY-MM-DD, "today", "friday", "in 3d", ...
    #[arg(long)]
    pub deadline: Option<String>,
    /// Clear the deadline.
    #[arg(long, conflicts_with = "deadline")]
    pub clear_deadline: bool,
    /// Estimated hours.
    #[arg(long)]
    pub estimate: Option<f64>,
    /// Logged hours.
    #[arg(long)]
    pub hours: Option<u32>,
    /// Logged minutes.
    #[arg(long)]
    pub minutes: Option<u32>,
    /// Move a top-level task to another project.
    #[arg(long)]
    pub project: Option<String>,
}

fn parse_deadline(input: Option<&str>) -> Result<Option<chrono::NaiveDate>> {
    match input {
        None => Ok(None),
        Some(s) => parse_deadline_input(s, local_today())
            .map(Some)
            .ok_or_else(|| TaskFirstError::InvalidInput(format!("unrecognised deadline '{s}'"))),
    }
}

impl ItemFields {
    fn into_new_item(self, title: String, project_id: Option<String>) -> Result<NewItem> {
        Ok(NewItem {
            title,
            description: self.desc,
            project_id,
            assignee_id: self.assignee,
            team: self.team,
            task_type: self.task_type,
            priority: self.priority,
            deadline: parse_deadline(self.deadline.as_deref())?,
            estimated_hours: self.estimate,
        })
    }
}

impl UpdateFields {
    fn into_update(self) -> Result<ItemUpdate> {
        Ok(ItemUpdate {
            title: self.title,
            description: self.desc,
            status: self.status,
            priority: self.priority,
            assignee_id: self.assignee,
            team: self.team,
            task_type: self.task_type,
            deadline: parse_deadline(self.deadline.as_deref())?,
            clear_deadline: self.clear_deadline,
            estimated_hours: self.estimate,
            duration_hours: self.hours,
            duration_minutes: self.minutes,
            project_id: self.project,
        })
    }
}

/// Launch the terminal UI on the given store.
pub fn cmd_ui(store: &mut dyn TaskStore, actor: &str) -> Result<()> {
    run_tui(store, actor).map_err(|e| TaskFirstError::io("terminal", e))
}

pub fn cmd_add(
    store: &mut dyn TaskStore,
    actor: &str,
    title: String,
    project: Option<String>,
    fields: ItemFields,
) -> Result<()> {
    let new = fields.into_new_item(title, project)?;
    let task = add_task(store, &new, actor, Utc::now())?;
    println!("Added task {}", task.id());
    Ok(())
}

pub fn cmd_add_sub(
    store: &mut dyn TaskStore,
    actor: &str,
    parent: String,
    title: String,
    fields: ItemFields,
) -> Result<()> {
    let new = fields.into_new_item(title, None)?;
    let sub = add_subtask(store, &parent, &new, actor, Utc::now())?;
    println!("Added subtask {} to {}", sub.id, parent);
    Ok(())
}

pub fn cmd_update(store: &mut dyn TaskStore, id: String, fields: UpdateFields) -> Result<()> {
    let update = fields.into_update()?;
    let item = update_item(store, &id, &update, Utc::now())?;
    println!("Updated {} ({})", item.id, item.status);
    Ok(())
}

pub fn cmd_handoff(
    store: &mut dyn TaskStore,
    id: String,
    comment: Option<String>,
    link: Option<String>,
    hours: Option<u32>,
    minutes: Option<u32>,
) -> Result<()> {
    let details = Handoff { comment, output_link: link, duration_hours: hours, duration_minutes: minutes };
    let item = handoff(store, &id, &details, Utc::now())?;
    println!(
        "Handed off {} after {}h {}m",
        item.id, item.duration_hours, item.duration_minutes
    );
    Ok(())
}

pub fn cmd_delete(store: &mut dyn TaskStore, id: String) -> Result<()> {
    delete_item(store, &id, Utc::now())?;
    println!("Deleted {}", id);
    Ok(())
}

fn user_label(users: &[User], id: &str) -> String {
    users.iter().find(|u| u.id == id).map(|u| u.name.clone()).unwrap_or_else(|| "-".into())
}

fn print_item_row(row: &str, item: &WorkItem, users: &[User], title: String) {
    let today = local_today();
    println!(
        "{:<6} {:<5} {:<17} {:<7} {:<10} {:<14} {:<12} {:>6} {:>7} {}",
        row,
        item.id,
        item.status.label(),
        item.priority.label(),
        format_deadline_relative(item.deadline, today),
        truncate(&user_label(users, &item.assignee_id), 14),
        truncate(&item.team, 12),
        format_estimate(item.estimate()),
        format!("{}h{:02}", item.duration_hours, item.duration_minutes),
        title
    );
}

/// Print tasks as spreadsheet rows. Subtasks are numbered `n.m` under task `n`.
pub fn print_table(tasks: &[&Task], users: &[User], expand: bool) {
    println!(
        "{:<6} {:<5} {:<17} {:<7} {:<10} {:<14} {:<12} {:>6} {:>7} {}",
        "#", "ID", "Status", "Pri", "Deadline", "Assignee", "Team", "Est", "Logged", "Title"
    );
    for (n, task) in tasks.iter().enumerate() {
        let (done, total) = task.subtask_progress();
        let title = if total > 0 {
            format!("{} [{}/{}]", task.item.title, done, total)
        } else {
            task.item.title.clone()
        };
        print_item_row(&(n + 1).to_string(), &task.item, users, title);
        if expand {
            for (m, sub) in task.sub_tasks.iter().enumerate() {
                print_item_row(&format!("{}.{}", n + 1, m + 1), sub, users, format!("  {}", sub.title));
            }
        }
    }
}

pub fn cmd_list(store: &dyn TaskStore, status: Option<Status>, expand: bool) -> Result<()> {
    let tasks = store.fetch_tasks()?;
    let users = store.fetch_users()?;
    let visible = filter_top_level(&tasks, status.map(StatusFilter::Only));
    debug!(shown = visible.len(), total = tasks.len(), "listing tasks");
    print_table(&visible, &users, expand);
    Ok(())
}

pub fn cmd_stats(store: &dyn TaskStore) -> Result<()> {
    let counts = stat_cards(&store.fetch_tasks()?);
    for card in StatusFilter::CARDS {
        println!("{:<18} {}", card.label(), counts.for_card(card));
    }
    Ok(())
}

pub fn cmd_dashboard(store: &dyn TaskStore, json: bool) -> Result<()> {
    let dash = Dashboard::compute(&store.fetch_tasks()?, &store.fetch_users()?);
    if json {
        println!("{}", serde_json::to_string_pretty(&dash)?);
        return Ok(());
    }

    let s = &dash.summary;
    println!("{:<22} {}", "Completion precision", s.precision_label());
    println!("{:<22} {}h", "Aggregate output", s.aggregate_output_hours);
    println!("{:<22} {}", "Workforce velocity", s.velocity_label());
    println!("{:<22} {}", "Task load factor", s.load_factor_label());

    let t = &dash.completion_timing;
    println!();
    println!("{:<10} {:<10} {}", "Early", "On time", "Late");
    println!("{:<10} {:<10} {}", t.early, t.on_time, t.late);

    println!();
    println!("{:<20} {:>6} {:>8} {:>8}", "Department", "Items", "Actual", "Est");
    for row in &dash.departments {
        println!(
            "{:<20} {:>6} {:>8} {:>8}",
            truncate(&row.team, 20),
            row.task_count,
            format_hours(row.actual_hours),
            format_hours(row.estimated_hours)
        );
    }

    println!();
    println!("{:<16} {:>5} {:>7} {:>6} {:>7}", "Assignee", "Done", "Ongoing", "Eff", "Hours");
    for row in &dash.assignees {
        println!(
            "{:<16} {:>5} {:>7} {:>6} {:>7}",
            truncate(&row.name, 16),
            row.completed,
            row.ongoing,
            format!("{}%", row.efficiency_percent),
            format_hours(row.total_hours)
        );
    }
    Ok(())
}

pub fn cmd_archive(store: &dyn TaskStore, search: Option<String>) -> Result<()> {
    let tasks = store.fetch_tasks()?;
    let users = store.fetch_users()?;
    let done = archive(&tasks, search.as_deref().unwrap_or(""));
    println!("{:<5} {:<28} {:<14} {:<17} {:>7} {}", "ID", "Title", "Assignee", "Completed", "Logged", "Handoff");
    for item in done {
        let completed = item
            .completed_at
            .map(|c| c.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<5} {:<28} {:<14} {:<17} {:>7} {}",
            item.id,
            truncate(&item.title, 28),
            truncate(&user_label(&users, &item.assignee_id), 14),
            completed,
            format!("{}h{:02}", item.duration_hours, item.duration_minutes),
            item.handoff_comment.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// List projects with the number of top-level tasks in each.
pub fn cmd_projects(store: &dyn TaskStore) -> Result<()> {
    let tasks = store.fetch_tasks()?;
    println!("{:<6} {:<24} {}", "ID", "Project", "Tasks");
    for p in store.fetch_projects()? {
        let count = tasks.iter().filter(|t| t.project_id == p.id).count();
        println!("{:<6} {:<24} {}", p.id, truncate(&p.name, 24), count);
    }
    Ok(())
}

pub fn cmd_project(store: &mut dyn TaskStore, action: ProjectAction) -> Result<()> {
    match action {
        ProjectAction::Add { name } => {
            let project = add_project(store, &name)?;
            println!("Added project {} ({})", project.id, project.name);
        }
        ProjectAction::Delete { id } => {
            store.delete_project(&id)?;
            println!("Deleted project {}", id);
        }
    }
    Ok(())
}

pub fn cmd_users(store: &dyn TaskStore) -> Result<()> {
    println!("{:<5} {:<16} {:<18} {}", "ID", "Name", "Team", "Email");
    for u in store.fetch_users()? {
        println!("{:<5} {:<16} {:<18} {}", u.id, truncate(&u.name, 16), truncate(&u.team, 18), u.email);
    }
    Ok(())
}

pub fn cmd_seed(store: &mut dyn TaskStore) -> Result<()> {
    if seed(store, local_today(), Utc::now())? {
        println!("Seeded demo projects and tasks");
    } else {
        println!("Workspace already has data; nothing seeded");
    }
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
