//! Early / on-time / late classification of finished work.

use chrono::NaiveTime;
use serde::Serialize;

use crate::task::WorkItem;

/// Items completed more than this long before their deadline count as early.
pub const EARLY_MARGIN_MS: i64 = 86_400_000;

/// How a finished item met its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Early,
    OnTime,
    Late,
}

/// Classify a finished item. The deadline is taken as midnight UTC of its
/// calendar day. Without both a deadline and a completion stamp the item is
/// on time.
pub fn classify(item: &WorkItem) -> Timing {
    let (Some(deadline), Some(completed)) = (item.deadline, item.completed_at) else {
        return Timing::OnTime;
    };
    let due_ms = deadline.and_time(NaiveTime::default()).and_utc().timestamp_millis();
    let diff_ms = due_ms - completed.timestamp_millis();

    if diff_ms > EARLY_MARGIN_MS {
        Timing::Early
    } else if diff_ms < 0 {
        Timing::Late
    } else {
        Timing::OnTime
    }
}

/// Counts of finished items per timing class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionTimingBuckets {
    pub early: usize,
    pub on_time: usize,
    pub late: usize,
}

impl CompletionTimingBuckets {
    pub fn total(&self) -> usize {
        self.early + self.on_time + self.late
    }
}

/// Bucket every finished item; unfinished items are ignored.
pub fn completion_timing(items: &[&WorkItem]) -> CompletionTimingBuckets {
    let mut buckets = CompletionTimingBuckets::default();
    for item in items.iter().filter(|i| i.is_finished()) {
        match classify(item) {
            Timing::Early => buckets.early += 1,
            Timing::OnTime => buckets.on_time += 1,
            Timing::Late => buckets.late += 1,
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn deadline() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn finished(id: &str, completed_offset: Option<Duration>) -> WorkItem {
        let mut it = WorkItem::new(id.into(), id.into(), "u1", "Design", "UI Design");
        it.status = Status::Finished;
        it.deadline = Some(deadline());
        let due = Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap();
        it.completed_at = completed_offset.map(|d| due + d);
        it
    }

    #[test]
    fn two_days_early_and_one_hour_late() {
        let early = finished("a", Some(Duration::days(-2)));
        let late = finished("b", Some(Duration::hours(1)));
        let buckets = completion_timing(&[&early, &late]);
        assert_eq!(buckets, CompletionTimingBuckets { early: 1, on_time: 0, late: 1 });
    }

    #[test]
    fn boundaries_are_on_time() {
        // exactly 24h before and exactly at the deadline
        let day_before = finished("a", Some(Duration::days(-1)));
        let at_deadline = finished("b", Some(Duration::zero()));
        assert_eq!(classify(&day_before), Timing::OnTime);
        assert_eq!(classify(&at_deadline), Timing::OnTime);

        let just_over_a_day = finished("c", Some(Duration::days(-1) - Duration::milliseconds(1)));
        assert_eq!(classify(&just_over_a_day), Timing::Early);
        let one_ms_late = finished("d", Some(Duration::milliseconds(1)));
        assert_eq!(classify(&one_ms_late), Timing::Late);
    }

    #[test]
    fn missing_facts_default_to_on_time() {
        let no_stamp = finished("a", None);
        let mut no_deadline = finished("b", Some(Duration::days(5)));
        no_deadline.deadline = None;
        assert_eq!(classify(&no_stamp), Timing::OnTime);
        assert_eq!(classify(&no_deadline), Timing::OnTime);
    }

    #[test]
    fn buckets_partition_finished_items_only() {
        let mut open = finished("x", Some(Duration::days(3)));
        open.status = Status::InProgress;
        let items = [
            finished("a", Some(Duration::days(-3))),
            finished("b", None),
            finished("c", Some(Duration::hours(2))),
            open,
        ];
        let refs: Vec<&WorkItem> = items.iter().collect();
        let buckets = completion_timing(&refs);
        let finished_count = refs.iter().filter(|i| i.is_finished()).count();
        assert_eq!(buckets.total(), finished_count);
        assert_eq!(buckets, CompletionTimingBuckets { early: 1, on_time: 1, late: 1 });
    }
}
