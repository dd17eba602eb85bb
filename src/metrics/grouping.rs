//! Per-department and per-assignee output aggregation.

use std::collections::HashMap;

use serde::Serialize;

use crate::task::{User, WorkItem};

/// Bucket for items with an empty team.
pub const UNASSIGNED_TEAM: &str = "Unassigned";
/// Bucket for items whose assignee is not in the user registry.
pub const UNKNOWN_ASSIGNEE: &str = "Unknown";

/// Round to one decimal place, halves away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Output of one department (team).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRow {
    pub team: String,
    pub task_count: usize,
    pub actual_hours: f64,
    pub estimated_hours: f64,
}

/// Output of one assignee.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeRow {
    pub name: String,
    pub completed: usize,
    pub ongoing: usize,
    pub efficiency_percent: u32,
    pub total_hours: f64,
}

/// Rows keyed by label, kept in first-seen order.
struct Groups<T> {
    index: HashMap<String, usize>,
    rows: Vec<(String, T)>,
}

impl<T: Default> Groups<T> {
    fn new() -> Self {
        Groups { index: HashMap::new(), rows: Vec::new() }
    }

    fn entry(&mut self, key: &str) -> &mut T {
        let idx = match self.index.get(key) {
            Some(&i) => i,
            None => {
                self.rows.push((key.to_string(), T::default()));
                self.index.insert(key.to_string(), self.rows.len() - 1);
                self.rows.len() - 1
            }
        };
        &mut self.rows[idx].1
    }
}

#[derive(Default)]
struct DepartmentAcc {
    tasks: usize,
    hours: f64,
    est: f64,
}

#[derive(Default)]
struct AssigneeAcc {
    completed: usize,
    ongoing: usize,
    efficiency: Option<f64>,
    total_hrs: f64,
}

/// Item counts and hours per team, busiest team first.
///
/// Every item counts towards its team and adds its estimate; only finished
/// items add actual hours. Teams with equal counts keep first-seen order.
pub fn by_department(items: &[&WorkItem]) -> Vec<DepartmentRow> {
    let mut groups: Groups<DepartmentAcc> = Groups::new();
    for item in items {
        let team = if item.team.is_empty() { UNASSIGNED_TEAM } else { item.team.as_str() };
        let acc = groups.entry(team);
        acc.tasks += 1;
        if item.is_finished() {
            acc.hours += item.actual_hours();
        }
        acc.est += item.estimate();
    }

    let mut rows: Vec<DepartmentRow> = groups
        .rows
        .into_iter()
        .map(|(team, acc)| DepartmentRow {
            team,
            task_count: acc.tasks,
            actual_hours: round1(acc.hours),
            estimated_hours: acc.est,
        })
        .collect();
    rows.sort_by(|a, b| b.task_count.cmp(&a.task_count));
    rows
}

/// Completed and ongoing work per assignee, most completions first.
///
/// Efficiency folds `estimate / actual * 100` over the assignee's finished
/// items as a running pairwise average: the first ratio is taken as is and
/// each later one is averaged with the value so far, so recent items weigh
/// more than a plain mean would give them. Items missing either figure do
/// not contribute a ratio.
pub fn by_assignee(items: &[&WorkItem], users: &[User]) -> Vec<AssigneeRow> {
    let names: HashMap<&str, &str> = users
        .iter()
        .filter(|u| !u.name.is_empty())
        .map(|u| (u.id.as_str(), u.name.as_str()))
        .collect();

    let mut groups: Groups<AssigneeAcc> = Groups::new();
    for item in items {
        let name = names.get(item.assignee_id.as_str()).copied().unwrap_or(UNKNOWN_ASSIGNEE);
        let acc = groups.entry(name);

        if item.is_finished() {
            acc.completed += 1;
            let actual = item.actual_hours();
            let est = item.estimate();
            acc.total_hrs += actual;
            if actual > 0.0 && est > 0.0 {
                let ratio = (est / actual) * 100.0;
                acc.efficiency = Some(match acc.efficiency {
                    None => ratio,
                    Some(current) => (current + ratio) / 2.0,
                });
            }
        } else {
            acc.ongoing += 1;
        }
    }

    let mut rows: Vec<AssigneeRow> = groups
        .rows
        .into_iter()
        .map(|(name, acc)| AssigneeRow {
            name,
            completed: acc.completed,
            ongoing: acc.ongoing,
            efficiency_percent: acc.efficiency.unwrap_or(0.0).round() as u32,
            total_hours: round1(acc.total_hrs),
        })
        .collect();
    rows.sort_by(|a, b| b.completed.cmp(&a.completed));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;

    fn user(id: &str, name: &str) -> User {
        User { id: id.into(), name: name.into(), email: String::new(), avatar: String::new(), team: String::new() }
    }

    fn work(id: &str, assignee: &str, team: &str, status: Status) -> WorkItem {
        let mut it = WorkItem::new(id.into(), id.into(), assignee, team, "UI Design");
        it.status = status;
        it.estimated_hours = None;
        it
    }

    fn done(id: &str, assignee: &str, est: f64, hours: u32, minutes: u32) -> WorkItem {
        let mut it = work(id, assignee, "Design", Status::Finished);
        it.estimated_hours = Some(est);
        it.duration_hours = hours;
        it.duration_minutes = minutes;
        it
    }

    #[test]
    fn efficiency_is_a_running_pairwise_average() {
        let a = done("a", "u1", 10.0, 10, 0);
        let b = done("b", "u1", 20.0, 10, 0);
        let rows = by_assignee(&[&a, &b], &[user("u1", "Alex Rivera")]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].efficiency_percent, 150);
        assert_eq!(rows[0].completed, 2);
        assert_eq!(rows[0].total_hours, 20.0);
    }

    #[test]
    fn efficiency_favours_recent_items() {
        // ratios 100, 200, 400: running value 100 -> 150 -> 275, plain mean would be 233
        let items = [done("a", "u1", 10.0, 10, 0), done("b", "u1", 20.0, 10, 0), done("c", "u1", 40.0, 10, 0)];
        let refs: Vec<&WorkItem> = items.iter().collect();
        let rows = by_assignee(&refs, &[user("u1", "Alex Rivera")]);
        assert_eq!(rows[0].efficiency_percent, 275);
    }

    #[test]
    fn items_without_estimate_or_effort_skip_efficiency() {
        let no_est = done("a", "u1", 0.0, 4, 0);
        let no_effort = done("b", "u1", 8.0, 0, 0);
        let rows = by_assignee(&[&no_est, &no_effort], &[user("u1", "Alex Rivera")]);
        assert_eq!(rows[0].efficiency_percent, 0);
        assert_eq!(rows[0].completed, 2);
        assert_eq!(rows[0].total_hours, 4.0);
    }

    #[test]
    fn unknown_assignees_share_a_bucket() {
        let a = work("a", "ghost", "Design", Status::InProgress);
        let b = work("b", "", "Design", Status::NotStarted);
        let rows = by_assignee(&[&a, &b], &[user("u1", "Alex Rivera")]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, UNKNOWN_ASSIGNEE);
        assert_eq!(rows[0].ongoing, 2);
    }

    #[test]
    fn assignees_sorted_by_completed_with_stable_ties() {
        let items = [
            work("a", "u1", "Design", Status::InProgress),
            done("b", "u2", 1.0, 1, 0),
            work("c", "u3", "Design", Status::NotStarted),
            done("d", "u4", 1.0, 1, 0),
        ];
        let refs: Vec<&WorkItem> = items.iter().collect();
        let users = [user("u1", "Alex"), user("u2", "Jordan"), user("u3", "Casey"), user("u4", "Sam")];
        let names: Vec<String> = by_assignee(&refs, &users).into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["Jordan", "Sam", "Alex", "Casey"]);
    }

    #[test]
    fn hours_round_to_one_decimal() {
        // 4h30 + 0h20 = 4.8333..
        let a = done("a", "u1", 8.0, 4, 30);
        let b = done("b", "u1", 1.0, 0, 20);
        let rows = by_assignee(&[&a, &b], &[user("u1", "Alex Rivera")]);
        assert_eq!(rows[0].total_hours, 4.8);
        let depts = by_department(&[&a, &b]);
        assert_eq!(depts[0].actual_hours, 4.8);
    }

    #[test]
    fn departments_count_everything_but_only_finished_hours() {
        let mut open = work("a", "u1", "Coding", Status::InProgress);
        open.duration_hours = 24;
        open.estimated_hours = Some(120.0);
        let finished = done("b", "u1", 8.0, 4, 30);
        let rows = by_department(&[&open, &finished]);
        assert_eq!(rows.len(), 2);
        let coding = rows.iter().find(|r| r.team == "Coding").unwrap();
        assert_eq!(coding.task_count, 1);
        assert_eq!(coding.actual_hours, 0.0);
        assert_eq!(coding.estimated_hours, 120.0);
        let design = rows.iter().find(|r| r.team == "Design").unwrap();
        assert_eq!(design.actual_hours, 4.5);
    }

    #[test]
    fn empty_team_is_unassigned() {
        let a = work("a", "u1", "", Status::NotStarted);
        let rows = by_department(&[&a]);
        assert_eq!(rows[0].team, UNASSIGNED_TEAM);
    }

    #[test]
    fn departments_sorted_by_count_with_stable_ties() {
        let items = [
            work("a", "u1", "Content", Status::NotStarted),
            work("b", "u1", "Design", Status::NotStarted),
            work("c", "u1", "Testing", Status::NotStarted),
            work("d", "u1", "Design", Status::NotStarted),
        ];
        let refs: Vec<&WorkItem> = items.iter().collect();
        let teams: Vec<String> = by_department(&refs).into_iter().map(|r| r.team).collect();
        assert_eq!(teams, ["Design", "Content", "Testing"]);
    }

    #[test]
    fn empty_input_gives_no_rows() {
        assert!(by_department(&[]).is_empty());
        assert!(by_assignee(&[], &[]).is_empty());
    }
}
