//! Order maintenance: re-derive every task's `order` from its position in
//! the flat collection.
//!
//! After [`renormalize`] the collection is laid out group by group (groups in
//! order of first appearance), each group's active tasks before its completed
//! ones. Active tasks get `0..k`, completed tasks continue at `k..k+m`, so
//! "completed sorts after active" falls out of the single order axis.

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::task::Task;

/// Reassign `order` for every group. Relative collection order within the
/// active run and within the completed run of a group is preserved.
///
/// Idempotent: `renormalize(renormalize(x)) == renormalize(x)`.
pub fn renormalize(tasks: Vec<Task>) -> Vec<Task> {
    let total = tasks.len();
    let mut groups: IndexMap<Option<String>, (Vec<Task>, Vec<Task>)> = IndexMap::new();
    for task in tasks {
        let (active, completed) = groups.entry(task.group_id.clone()).or_default();
        if task.completed {
            completed.push(task);
        } else {
            active.push(task);
        }
    }

    let mut out = Vec::with_capacity(total);
    for (_, (active, completed)) in groups {
        let offset = active.len();
        out.extend(active.into_iter().enumerate().map(|(i, mut t)| {
            t.order = i;
            t
        }));
        out.extend(completed.into_iter().enumerate().map(|(i, mut t)| {
            t.order = offset + i;
            t
        }));
    }
    out
}

/// Renormalize a collection held behind a mutable reference.
pub fn renormalize_in_place(tasks: &mut Vec<Task>) {
    *tasks = renormalize(std::mem::take(tasks));
}

/// A broken ordering invariant found by [`check_order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderViolation {
    /// A group's order values are not `0..n` in collection order
    NonContiguous {
        group_id: Option<String>,
        expected: usize,
        found: usize,
        task_id: String,
    },
    /// A completed task precedes an active task of the same group
    CompletedBeforeActive {
        group_id: Option<String>,
        task_id: String,
    },
}

/// Report every group whose layout or order values differ from what
/// [`renormalize`] would produce. Read-only.
pub fn check_order(tasks: &[Task]) -> Vec<OrderViolation> {
    let mut violations = Vec::new();
    let mut groups: IndexMap<Option<&str>, Vec<&Task>> = IndexMap::new();
    for task in tasks {
        groups.entry(task.group_key()).or_default().push(task);
    }

    for (group, members) in groups {
        let group_id = group.map(str::to_string);
        let mut seen_completed = false;
        for (expected, task) in members.iter().enumerate() {
            if task.completed {
                seen_completed = true;
            } else if seen_completed {
                violations.push(OrderViolation::CompletedBeforeActive {
                    group_id: group_id.clone(),
                    task_id: task.id.clone(),
                });
            }
            if task.order != expected {
                violations.push(OrderViolation::NonContiguous {
                    group_id: group_id.clone(),
                    expected,
                    found: task.order,
                    task_id: task.id.clone(),
                });
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::{board, ids, orders};

    #[test]
    fn test_active_then_completed_per_group() {
        let tasks = board(&[
            ("A", Some("g1"), true),
            ("B", Some("g1"), false),
            ("X", Some("g2"), false),
            ("C", Some("g1"), false),
        ]);
        let out = renormalize(tasks);
        assert_eq!(ids(&out), vec!["B", "C", "A", "X"]);
        assert_eq!(orders(&out), vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_ungrouped_is_its_own_partition() {
        let tasks = board(&[
            ("A", None, false),
            ("B", Some("g1"), false),
            ("C", None, true),
            ("D", None, false),
        ]);
        let out = renormalize(tasks);
        assert_eq!(ids(&out), vec!["A", "D", "C", "B"]);
        assert_eq!(orders(&out), vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_stale_order_values_are_ignored() {
        let mut tasks = board(&[("A", Some("g1"), false), ("B", Some("g1"), false)]);
        tasks[0].order = 7;
        tasks[1].order = 3;
        let out = renormalize(tasks);
        assert_eq!(ids(&out), vec!["A", "B"]);
        assert_eq!(orders(&out), vec![0, 1]);
    }

    #[test]
    fn test_idempotent() {
        let tasks = board(&[
            ("A", Some("g1"), true),
            ("B", None, false),
            ("C", Some("g1"), false),
            ("D", Some("g2"), true),
        ]);
        let once = renormalize(tasks);
        let twice = renormalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_collection() {
        assert!(renormalize(Vec::new()).is_empty());
    }

    #[test]
    fn test_check_order_clean_after_renormalize() {
        let tasks = board(&[
            ("A", Some("g1"), true),
            ("B", Some("g1"), false),
            ("C", None, false),
        ]);
        assert!(!check_order(&tasks).is_empty());
        assert!(check_order(&renormalize(tasks)).is_empty());
    }

    #[test]
    fn test_check_order_reports_completed_before_active() {
        let mut tasks = board(&[("A", Some("g1"), true), ("B", Some("g1"), false)]);
        tasks[0].order = 0;
        tasks[1].order = 1;
        let violations = check_order(&tasks);
        assert_eq!(
            violations,
            vec![OrderViolation::CompletedBeforeActive {
                group_id: Some("g1".into()),
                task_id: "B".into(),
            }]
        );
    }
}
