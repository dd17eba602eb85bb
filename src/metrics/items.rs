//! Flattening tasks and their subtasks into one work-item collection.

use crate::task::{Task, WorkItem};

/// Every task followed by its subtasks, in original order.
///
/// Nesting is exactly one level deep, so the result holds each task and each
/// subtask once: `[t1, t1.s1, t1.s2, t2, t2.s1, ...]`.
pub fn flatten(tasks: &[Task]) -> Vec<&WorkItem> {
    let total = tasks.iter().map(|t| 1 + t.sub_tasks.len()).sum();
    let mut items = Vec::with_capacity(total);
    for task in tasks {
        items.push(&task.item);
        items.extend(task.sub_tasks.iter());
    }
    items
}

/// Finished items whose title or handoff comment contains `search`,
/// ignoring case. All top-level tasks come first, then all subtasks.
/// An empty search lists every finished item.
pub fn archive<'a>(tasks: &'a [Task], search: &str) -> Vec<&'a WorkItem> {
    let needle = search.to_lowercase();
    let matches = |item: &WorkItem| {
        item.title.to_lowercase().contains(&needle)
            || item
                .handoff_comment
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
    };

    tasks
        .iter()
        .map(|t| &t.item)
        .chain(tasks.iter().flat_map(|t| t.sub_tasks.iter()))
        .filter(|item| item.is_finished() && matches(item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;
    use chrono::{TimeZone, Utc};

    fn item(id: &str, status: Status) -> WorkItem {
        let mut it = WorkItem::new(id.into(), format!("Item {id}"), "u1", "Design", "UI Design");
        it.status = status;
        it
    }

    fn task(id: &str, status: Status, subs: &[(&str, Status)]) -> Task {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut t = Task::new(item(id, status), "p1".into(), now);
        t.sub_tasks = subs.iter().map(|(sid, s)| item(sid, *s)).collect();
        t
    }

    #[test]
    fn flatten_keeps_parent_then_children_order() {
        let tasks = vec![
            task("t1", Status::InProgress, &[("s1", Status::Finished), ("s2", Status::NotStarted)]),
            task("t2", Status::NotStarted, &[("s3", Status::InProgress)]),
        ];
        let ids: Vec<&str> = flatten(&tasks).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["t1", "s1", "s2", "t2", "s3"]);
    }

    #[test]
    fn flatten_size_is_tasks_plus_subtasks() {
        let tasks = vec![
            task("t1", Status::InProgress, &[("s1", Status::Finished)]),
            task("t2", Status::NotStarted, &[]),
            task("t3", Status::Finished, &[("s2", Status::Finished), ("s3", Status::Finished)]),
        ];
        let expected = tasks.len() + tasks.iter().map(|t| t.sub_tasks.len()).sum::<usize>();
        assert_eq!(flatten(&tasks).len(), expected);
    }

    #[test]
    fn flatten_empty() {
        assert!(flatten(&[]).is_empty());
    }

    #[test]
    fn archive_lists_tasks_before_subtasks() {
        let tasks = vec![
            task("t1", Status::InProgress, &[("s1", Status::Finished)]),
            task("t2", Status::Finished, &[]),
        ];
        let ids: Vec<&str> = archive(&tasks, "").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["t2", "s1"]);
    }

    #[test]
    fn archive_searches_title_and_comment() {
        let mut tasks = vec![task("t1", Status::InProgress, &[("s1", Status::Finished), ("s2", Status::Finished)])];
        tasks[0].sub_tasks[0].handoff_comment = Some("Initial SKETCHES done.".into());
        tasks[0].sub_tasks[1].title = "Palette".into();

        let ids: Vec<&str> = archive(&tasks, "sketches").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["s1"]);
        let ids: Vec<&str> = archive(&tasks, "PALETTE").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["s2"]);
        assert!(archive(&tasks, "nothing like this").is_empty());
    }
}
