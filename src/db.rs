//! Workspace document and utility functions.
//!
//! This module provides the `Workspace` struct that is persisted as one JSON
//! document, the reference and demo data a fresh workspace starts from, and
//! helpers for id generation, date parsing and display formatting.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TaskFirstError};
use crate::fields::*;
use crate::task::{Document, Project, Task, User, WorkItem};

/// The persisted workspace: reference data plus every task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub task_types: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Workspace {
    /// Load a workspace from a JSON file. A missing file yields the
    /// reference workspace; an unreadable or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "workspace file missing, using reference data");
            return Ok(Workspace::reference());
        }
        let mut buf = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut buf))
            .map_err(|e| TaskFirstError::io(path, e))?;
        serde_json::from_str(&buf).map_err(|source| TaskFirstError::Parse { path: path.to_path_buf(), source })
    }

    /// Save the workspace to a JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| TaskFirstError::io(dir, e))?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let write = || -> std::io::Result<()> {
            let mut f = File::create(&tmp)?;
            f.write_all(data.as_bytes())?;
            f.flush()?;
            fs::rename(&tmp, path)
        };
        write().map_err(|e| TaskFirstError::io(path, e))
    }

    /// Users, departments and task types, with no projects and no tasks.
    pub fn reference() -> Self {
        Workspace {
            projects: Vec::new(),
            users: vec![
                user("u1", "Alex Rivera", "alex", "Design"),
                user("u2", "Jordan Smith", "jordan", "Coding"),
                user("u3", "Casey Jones", "casey", "Testing"),
                user("u4", "Sam Taylor", "sam", "Content"),
            ],
            departments: ["Design", "Coding", "Testing", "Content", "Digital Marketing", "Leadership", "Delivery"]
                .into_iter()
                .map(String::from)
                .collect(),
            task_types: [
                "UI Design",
                "Backend Dev",
                "Frontend Dev",
                "UX Research",
                "Unit Testing",
                "QA Review",
                "Copywriting",
                "SEO Optimization",
                "Stakeholder Review",
                "Deployment",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            tasks: Vec::new(),
        }
    }

    /// The reference workspace populated with the demo projects and tasks.
    pub fn demo(today: NaiveDate, now: DateTime<Utc>) -> Self {
        Workspace { projects: demo_projects(), tasks: demo_tasks(today, now), ..Workspace::reference() }
    }
}

fn user(id: &str, name: &str, handle: &str, team: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{handle}@taskfirst.com"),
        avatar: format!("https://picsum.photos/seed/{id}/40"),
        team: team.to_string(),
    }
}

/// Projects created by seeding and present in the demo workspace.
pub fn demo_projects() -> Vec<Project> {
    [("p1", "Alpha Redesign"), ("p2", "Stripe Integration"), ("p3", "Mobile App V2")]
        .into_iter()
        .map(|(id, name)| Project { id: id.to_string(), name: name.to_string() })
        .collect()
}

/// Demo tasks with deadlines relative to `today`.
pub fn demo_tasks(today: NaiveDate, now: DateTime<Utc>) -> Vec<Task> {
    let mut sketching = WorkItem::new("s1".into(), "Logo Sketching".into(), "u1", "Design", "UX Research");
    sketching.status = Status::Finished;
    sketching.deadline = Some(today - Duration::days(1));
    sketching.estimated_hours = Some(8.0);
    sketching.handoff_comment = Some("Initial sketches done.".into());
    sketching.duration_hours = 4;
    sketching.duration_minutes = 30;
    sketching.document_history.push(Document {
        id: "d1".into(),
        name: "Draft 1.png".into(),
        url: "#".into(),
        kind: "image/png".into(),
        uploaded_at: now,
    });

    let mut brand = WorkItem::new("t1".into(), "Brand Identity Overhaul".into(), "u1", "Design", "UI Design");
    brand.description = Some("Refresh the logo and digital assets.".into());
    brand.priority = Priority::High;
    brand.status = Status::InProgress;
    brand.deadline = Some(today + Duration::days(1));
    brand.estimated_hours = Some(40.0);
    brand.duration_hours = 12;
    let mut brand = Task::new(brand, "p1".into(), now);
    brand.sub_tasks.push(sketching);

    let mut payments = WorkItem::new("t2".into(), "API Integration - Payments".into(), "u2", "Coding", "Backend Dev");
    payments.creator_id = "u1".into();
    payments.description = Some("Integrate Stripe Connect.".into());
    payments.priority = Priority::Urgent;
    payments.deadline = Some(today + Duration::days(2));
    payments.estimated_hours = Some(120.0);
    payments.duration_hours = 24;
    payments.comments.push(crate::task::Comment {
        id: "c1".into(),
        from_user_id: "u2".into(),
        to_user_id: Some("u1".into()),
        text: "Does the API need to support multi-currency?".into(),
        timestamp: now,
        is_clarification: true,
        reply_text: None,
    });

    vec![brand, Task::new(payments, "p2".into(), now)]
}

/// Next id of the form `<prefix><n>`, one past the highest numeric suffix in use.
pub fn next_id<'a>(prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let max = existing
        .into_iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|n| n.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{prefix}{}", max + 1)
}

/// Parse human-readable deadline input with natural language support.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "next monday", "friday", "this friday"
/// - "end of week", "end of month"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD" format
pub fn parse_deadline_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return days_from(today, 1),
        "yesterday" => return days_from(today, -1),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 { (today.year() + 1, 1) } else { (today.year(), today.month() + 1) };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return days_from(today, days);
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Duration::try_weeks(weeks).and_then(|d| today.checked_add_signed(d));
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current_day = today.weekday().num_days_from_monday() as i64;
    for (day_name, target_day) in weekdays {
        let days_ahead = (target_day + 7 - current_day) % 7;
        if s == day_name || s == format!("this {day_name}") {
            return days_from(today, days_ahead);
        }
        if s == format!("next {day_name}") {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return days_from(today, days_to_add);
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// `today` shifted by `days`, or `None` when the result leaves chrono's range.
fn days_from(today: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|d| today.checked_add_signed(d))
}

/// Start and end dates of the ISO week (Monday to Sunday) containing `today`.
pub fn start_end_of_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Format a deadline relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_deadline_relative(deadline: Option<NaiveDate>, today: NaiveDate) -> String {
    match deadline {
        None => "-".into(),
        Some(d) => {
            let days = (d - today).num_days();
            match days {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {n}d"),
                n => format!("{}d late", -n),
            }
        }
    }
}

/// Format hours with one decimal, dropping a trailing ".0".
pub fn format_hours(hours: f64) -> String {
    let s = format!("{hours:.1}");
    s.strip_suffix(".0").map(str::to_string).unwrap_or(s)
}

/// Format an optional estimate the way the spreadsheet shows it ("-" for none).
pub fn format_estimate(estimate: f64) -> String {
    if estimate > 0.0 {
        format!("{}h", format_hours(estimate))
    } else {
        "-".into()
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Today's local date.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
