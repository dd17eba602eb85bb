//! Status counts for the stat cards and the top-level status filter.

use serde::Serialize;

use crate::fields::{Status, StatusFilter};
use crate::task::{Task, WorkItem};

use super::items::flatten;

/// Number of items with the given status.
pub fn count_by_status(items: &[&WorkItem], status: Status) -> usize {
    items.iter().filter(|i| i.status == status).count()
}

/// Values shown on the five stat cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatCardCounts {
    pub total: usize,
    pub not_started: usize,
    pub in_progress: usize,
    pub awaiting_clarity: usize,
    pub finished: usize,
}

impl StatCardCounts {
    pub fn from_items(items: &[&WorkItem]) -> Self {
        StatCardCounts {
            total: items.len(),
            not_started: count_by_status(items, Status::NotStarted),
            in_progress: count_by_status(items, Status::InProgress),
            awaiting_clarity: count_by_status(items, Status::AwaitingClarity),
            finished: count_by_status(items, Status::Finished),
        }
    }

    /// The count displayed on a card.
    pub fn for_card(&self, card: StatusFilter) -> usize {
        match card {
            StatusFilter::Total => self.total,
            StatusFilter::Only(Status::NotStarted) => self.not_started,
            StatusFilter::Only(Status::InProgress) => self.in_progress,
            StatusFilter::Only(Status::AwaitingClarity) => self.awaiting_clarity,
            StatusFilter::Only(Status::Finished) => self.finished,
        }
    }
}

/// Stat-card counts over tasks and subtasks together.
pub fn stat_cards(tasks: &[Task]) -> StatCardCounts {
    StatCardCounts::from_items(&flatten(tasks))
}

/// Top-level tasks matching the active filter.
///
/// A task matches when it or any of its subtasks has the filtered status, so
/// a matching subtask is always shown with its parent. No filter, or the
/// `Total` card, keeps every task.
pub fn filter_top_level(tasks: &[Task], filter: Option<StatusFilter>) -> Vec<&Task> {
    match filter {
        None | Some(StatusFilter::Total) => tasks.iter().collect(),
        Some(StatusFilter::Only(status)) => tasks
            .iter()
            .filter(|t| t.item.status == status || t.sub_tasks.iter().any(|s| s.status == status))
            .collect(),
    }
}

/// Selecting the active card clears the filter; any other card replaces it.
pub fn toggle_filter(active: Option<StatusFilter>, selected: StatusFilter) -> Option<StatusFilter> {
    if active == Some(selected) {
        None
    } else {
        Some(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use clap::ValueEnum;

    fn item(id: &str, status: Status) -> WorkItem {
        let mut it = WorkItem::new(id.into(), id.into(), "u1", "Design", "UI Design");
        it.status = status;
        it
    }

    fn task(id: &str, status: Status, subs: &[(&str, Status)]) -> Task {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut t = Task::new(item(id, status), "p1".into(), now);
        t.sub_tasks = subs.iter().map(|(sid, s)| item(sid, *s)).collect();
        t
    }

    fn sample() -> Vec<Task> {
        vec![
            task("t1", Status::InProgress, &[("s1", Status::Finished), ("s2", Status::AwaitingClarity)]),
            task("t2", Status::NotStarted, &[]),
            task("t3", Status::Finished, &[("s3", Status::NotStarted)]),
        ]
    }

    #[test]
    fn status_counts_partition_items() {
        let tasks = sample();
        let items = flatten(&tasks);
        let sum: usize = Status::value_variants().iter().map(|s| count_by_status(&items, *s)).sum();
        assert_eq!(sum, items.len());
    }

    #[test]
    fn stat_cards_count_subtasks() {
        let cards = stat_cards(&sample());
        assert_eq!(
            cards,
            StatCardCounts { total: 6, not_started: 2, in_progress: 1, awaiting_clarity: 1, finished: 2 }
        );
        assert_eq!(cards.for_card(StatusFilter::Total), 6);
        assert_eq!(cards.for_card(StatusFilter::Only(Status::AwaitingClarity)), 1);
    }

    #[test]
    fn empty_list_has_zero_counts() {
        assert_eq!(stat_cards(&[]), StatCardCounts::default());
    }

    #[test]
    fn finished_subtask_counts_and_surfaces_parent() {
        let tasks = vec![task("t1", Status::InProgress, &[("s1", Status::Finished)])];
        assert_eq!(count_by_status(&flatten(&tasks), Status::Finished), 1);

        let filtered = filter_top_level(&tasks, Some(StatusFilter::Only(Status::Finished)));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id(), "t1");
    }

    #[test]
    fn filter_matches_task_or_any_subtask() {
        let tasks = sample();
        for &status in Status::value_variants() {
            let ids: Vec<&str> = filter_top_level(&tasks, Some(StatusFilter::Only(status)))
                .iter()
                .map(|t| t.id())
                .collect();
            let expected: Vec<&str> = tasks
                .iter()
                .filter(|t| t.item.status == status || t.sub_tasks.iter().any(|s| s.status == status))
                .map(|t| t.id())
                .collect();
            assert_eq!(ids, expected, "filter {status}");
        }
    }

    #[test]
    fn no_filter_and_total_keep_everything() {
        let tasks = sample();
        assert_eq!(filter_top_level(&tasks, None).len(), 3);
        assert_eq!(filter_top_level(&tasks, Some(StatusFilter::Total)).len(), 3);
    }

    #[test]
    fn toggling_same_card_clears_filter() {
        let finished = StatusFilter::Only(Status::Finished);
        let active = toggle_filter(None, finished);
        assert_eq!(active, Some(finished));
        assert_eq!(toggle_filter(active, finished), None);
        assert_eq!(toggle_filter(active, StatusFilter::Total), Some(StatusFilter::Total));
    }

    #[test]
    fn counting_is_repeatable() {
        let tasks = sample();
        assert_eq!(stat_cards(&tasks), stat_cards(&tasks));
    }
}
