//! Enumerations and field types for work items.
//!
//! This module defines the structured values shared by tasks and subtasks:
//! workflow status, priority, and the single status filter the workspace
//! applies to its top-level list.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Workflow status of a task or subtask.
///
/// Serialized with the display labels used by the stored workspace
/// (`"Not Started"`, `"In Progress"`, ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum Status {
    #[serde(rename = "Not Started", alias = "not-started")]
    NotStarted,
    #[serde(rename = "In Progress", alias = "in-progress")]
    InProgress,
    #[serde(rename = "Finished", alias = "finished")]
    Finished,
    #[serde(rename = "Awaiting Clarity", alias = "awaiting-clarity")]
    AwaitingClarity,
}

impl Status {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Status::NotStarted => "Not Started",
            Status::InProgress => "In Progress",
            Status::Finished => "Finished",
            Status::AwaitingClarity => "Awaiting Clarity",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Priority classification for work items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum Priority {
    #[serde(rename = "Low", alias = "low")]
    Low,
    #[serde(rename = "Medium", alias = "medium")]
    Medium,
    #[serde(rename = "High", alias = "high")]
    High,
    #[serde(rename = "Urgent", alias = "urgent")]
    Urgent,
}

impl Priority {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The stat-card filter applied to the top-level task list.
///
/// `Total` is the "all items" card: selecting it highlights the card but
/// keeps every task. An absent filter (`Option::None`) behaves the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Total,
    Only(Status),
}

impl StatusFilter {
    /// The five stat cards, left to right.
    pub const CARDS: [StatusFilter; 5] = [
        StatusFilter::Total,
        StatusFilter::Only(Status::NotStarted),
        StatusFilter::Only(Status::InProgress),
        StatusFilter::Only(Status::AwaitingClarity),
        StatusFilter::Only(Status::Finished),
    ];

    /// Card label.
    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::Total => "Total Items",
            StatusFilter::Only(Status::NotStarted) => "Not Started",
            StatusFilter::Only(Status::InProgress) => "On Going",
            StatusFilter::Only(Status::AwaitingClarity) => "Awaiting Clarity",
            StatusFilter::Only(Status::Finished) => "Finished",
        }
    }
}
