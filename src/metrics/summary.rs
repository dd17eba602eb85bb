//! Headline metrics and the complete dashboard snapshot.

use serde::Serialize;

use crate::task::{Task, User, WorkItem};

use super::grouping::{by_assignee, by_department, AssigneeRow, DepartmentRow};
use super::items::flatten;
use super::status::StatCardCounts;
use super::timing::{completion_timing, CompletionTimingBuckets};

/// The four headline figures on the insights view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    /// Share of finished items delivered early or on time.
    pub completion_precision_percent: u32,
    /// Whole logged hours across all items; minutes are left out.
    pub aggregate_output_hours: u64,
    /// Efficiency of the assignee with the most completions.
    pub workforce_velocity_percent: u32,
    /// Work items per registered user.
    pub task_load_factor: f64,
}

impl SummaryMetrics {
    /// Combine the classifier and aggregator outputs.
    ///
    /// `assignees` must already be sorted by completions. Both divisions are
    /// floored at one: no finished items gives 0% precision, and an empty
    /// user registry divides the item count by one.
    pub fn compose(
        items: &[&WorkItem],
        timing: &CompletionTimingBuckets,
        assignees: &[AssigneeRow],
        user_count: usize,
    ) -> Self {
        let finished = items.iter().filter(|i| i.is_finished()).count();
        let precise = (timing.early + timing.on_time) as f64;
        let completion_precision_percent = (precise / finished.max(1) as f64 * 100.0).round() as u32;

        let aggregate_output_hours = items.iter().map(|i| u64::from(i.duration_hours)).sum();

        let workforce_velocity_percent = assignees.first().map_or(0, |row| row.efficiency_percent);

        let task_load_factor = items.len() as f64 / user_count.max(1) as f64;

        SummaryMetrics {
            completion_precision_percent,
            aggregate_output_hours,
            workforce_velocity_percent,
            task_load_factor,
        }
    }

    pub fn precision_label(&self) -> String {
        format!("{}%", self.completion_precision_percent)
    }

    pub fn velocity_label(&self) -> String {
        format!("{}%", self.workforce_velocity_percent)
    }

    pub fn load_factor_label(&self) -> String {
        to_fixed_1(self.task_load_factor)
    }
}

/// Format with one decimal, rounding exact halves up (1.25 -> "1.3").
///
/// `{:.1}` rounds exact halves to even; the only exact halves at one decimal
/// are odd multiples of 0.25, which are nudged before formatting.
pub fn to_fixed_1(value: f64) -> String {
    let quarters = value * 4.0;
    if quarters.fract() == 0.0 && quarters.rem_euclid(2.0) == 1.0 {
        format!("{:.1}", value + 0.05)
    } else {
        format!("{value:.1}")
    }
}

/// Everything the workspace and insights views display, computed from one
/// snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stat_cards: StatCardCounts,
    pub completion_timing: CompletionTimingBuckets,
    pub departments: Vec<DepartmentRow>,
    pub assignees: Vec<AssigneeRow>,
    pub summary: SummaryMetrics,
}

impl Dashboard {
    pub fn compute(tasks: &[Task], users: &[User]) -> Self {
        let items = flatten(tasks);
        let completion_timing = completion_timing(&items);
        let departments = by_department(&items);
        let assignees = by_assignee(&items, users);
        let summary = SummaryMetrics::compose(&items, &completion_timing, &assignees, users.len());

        Dashboard {
            stat_cards: StatCardCounts::from_items(&items),
            completion_timing,
            departments,
            assignees,
            summary,
        }
    }
}
