//! Task data structures and related functionality.
//!
//! A `Task` is a top-level work item that belongs to a project and owns an
//! ordered list of subtasks. Subtasks share every field the metrics care
//! about, so both are built around the same `WorkItem` record; a `SubTask`
//! is simply a `WorkItem` stored inside its parent.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, TaskFirstError};
use crate::fields::*;

/// A registered workspace member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub team: String,
}

/// A project that top-level tasks are filed under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
}

/// A note on a work item. Clarification requests are addressed to a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub from_user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_user_id: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_clarification: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_text: Option<String>,
}

/// A document attached to a work item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A manager's quality rating of a delivered item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub stars: u8,
    #[serde(default)]
    pub comment: String,
}

/// The fields shared by tasks and subtasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    #[serde(default)]
    pub assignee_id: String,
    #[serde(default)]
    pub creator_id: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub task_type: String,
    #[serde(default, deserialize_with = "blank_date", skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handoff_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_link: Option<String>,
    #[serde(default)]
    pub duration_hours: u32,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub document_history: Vec<Document>,
}

/// A subtask lives inside its parent task and has no children of its own.
pub type SubTask = WorkItem;

/// A top-level work item filed under a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(flatten)]
    pub item: WorkItem,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
    #[serde(default)]
    pub documents: Vec<Document>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Deadlines cleared in a date picker are stored as `""`.
fn blank_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Field changes applied by `update`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<String>,
    pub team: Option<String>,
    pub task_type: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub clear_deadline: bool,
    pub estimated_hours: Option<f64>,
    pub duration_hours: Option<u32>,
    pub duration_minutes: Option<u32>,
    pub project_id: Option<String>,
}

/// What the assignee hands over when finishing an item.
#[derive(Debug, Clone, Default)]
pub struct Handoff {
    pub comment: Option<String>,
    pub output_link: Option<String>,
    pub duration_hours: Option<u32>,
    pub duration_minutes: Option<u32>,
}

impl WorkItem {
    /// A fresh, unstarted item with the workspace defaults.
    pub fn new(id: String, title: String, assignee_id: &str, team: &str, task_type: &str) -> Self {
        WorkItem {
            id,
            title,
            description: None,
            status: Status::NotStarted,
            priority: Priority::Medium,
            assignee_id: assignee_id.to_string(),
            creator_id: assignee_id.to_string(),
            team: team.to_string(),
            task_type: task_type.to_string(),
            deadline: None,
            completed_at: None,
            handoff_comment: None,
            output_link: None,
            duration_hours: 0,
            duration_minutes: 0,
            estimated_hours: Some(0.0),
            rating: None,
            comments: Vec::new(),
            document_history: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == Status::Finished
    }

    /// Actual effort in fractional hours. Minutes are not normalised, so
    /// 90 minutes count as 1.5 hours on top of `duration_hours`.
    pub fn actual_hours(&self) -> f64 {
        f64::from(self.duration_hours) + f64::from(self.duration_minutes) / 60.0
    }

    /// Planned effort, 0 when no estimate was given.
    pub fn estimate(&self) -> f64 {
        self.estimated_hours.unwrap_or(0.0)
    }

    /// Apply field edits. Finishing goes through [`WorkItem::handoff`], and a
    /// finished item cannot be reopened.
    pub fn apply(&mut self, update: &ItemUpdate) -> Result<()> {
        match update.status {
            Some(Status::Finished) if !self.is_finished() => {
                return Err(TaskFirstError::UseHandoff(self.id.clone()));
            }
            Some(status) if self.is_finished() && status != Status::Finished => {
                return Err(TaskFirstError::AlreadyFinished(self.id.clone()));
            }
            _ => {}
        }
        if let Some(estimate) = update.estimated_hours {
            if !estimate.is_finite() || estimate < 0.0 {
                return Err(TaskFirstError::InvalidInput(format!(
                    "estimate must be a non-negative number of hours, got {estimate}"
                )));
            }
        }
        if let Some(ref title) = update.title {
            self.title = title.clone();
        }
        if let Some(ref desc) = update.description {
            self.description = Some(desc.clone());
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(ref assignee) = update.assignee_id {
            self.assignee_id = assignee.clone();
        }
        if let Some(ref team) = update.team {
            self.team = team.clone();
        }
        if let Some(ref task_type) = update.task_type {
            self.task_type = task_type.clone();
        }
        if update.clear_deadline {
            self.deadline = None;
        } else if let Some(deadline) = update.deadline {
            self.deadline = Some(deadline);
        }
        if let Some(estimate) = update.estimated_hours {
            self.estimated_hours = Some(estimate);
        }
        if let Some(hours) = update.duration_hours {
            self.duration_hours = hours;
        }
        if let Some(minutes) = update.duration_minutes {
            self.duration_minutes = minutes;
        }
        Ok(())
    }

    /// Move the item to Finished and stamp the completion time. An item is
    /// handed off at most once.
    pub fn handoff(&mut self, handoff: &Handoff, now: DateTime<Utc>) -> Result<()> {
        if self.is_finished() {
            return Err(TaskFirstError::AlreadyFinished(self.id.clone()));
        }
        self.status = Status::Finished;
        self.completed_at = Some(now);
        if let Some(ref comment) = handoff.comment {
            self.handoff_comment = Some(comment.clone());
        }
        if let Some(ref link) = handoff.output_link {
            self.output_link = Some(link.clone());
        }
        if let Some(hours) = handoff.duration_hours {
            self.duration_hours = hours;
        }
        if let Some(minutes) = handoff.duration_minutes {
            self.duration_minutes = minutes;
        }
        Ok(())
    }
}

impl Task {
    pub fn new(mut item: WorkItem, project_id: String, now: DateTime<Utc>) -> Self {
        item.description.get_or_insert_with(String::new);
        Task {
            item,
            project_id,
            sub_tasks: Vec::new(),
            documents: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }

    /// Finished subtasks and total subtasks, for the progress indicator.
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.sub_tasks.iter().filter(|s| s.is_finished()).count();
        (done, self.sub_tasks.len())
    }

    /// This task or one of its subtasks, by id.
    pub fn find_item(&self, id: &str) -> Option<&WorkItem> {
        if self.item.id == id {
            return Some(&self.item);
        }
        self.sub_tasks.iter().find(|s| s.id == id)
    }

    pub fn find_item_mut(&mut self, id: &str) -> Option<&mut WorkItem> {
        if self.item.id == id {
            return Some(&mut self.item);
        }
        self.sub_tasks.iter_mut().find(|s| s.id == id)
    }
}
