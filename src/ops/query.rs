use chrono::{Local, NaiveDate};

use crate::model::group::Group;
use crate::model::task::Task;
use crate::ops::group_ops::group_position;

/// Which list the board is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    /// All open tasks across groups
    #[default]
    All,
    /// One group, active tasks then completed
    Group(String),
    Notes,
    Archive,
}

/// Case-insensitive match against title, descriptions, and subtask titles.
pub fn matches_search(task: &Task, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let hit = |s: &str| s.to_lowercase().contains(&needle);
    hit(&task.title)
        || hit(&task.description)
        || task.description_entries.iter().any(|e| hit(&e.text))
        || task.subtasks.iter().any(|s| hit(&s.title))
}

/// Tasks to render for a view, sorted by group position, then active
/// before completed, then `order`.
///
/// A non-empty search query overrides the view and searches every task.
/// The `All` view hides completed tasks; `Notes` and `Archive` show no tasks.
/// Groups missing from the group list (including ungrouped) sort first.
pub fn visible_tasks<'a>(
    tasks: &'a [Task],
    groups: &[Group],
    view: &View,
    query: &str,
) -> Vec<&'a Task> {
    let mut out: Vec<&Task> = if !query.trim().is_empty() {
        tasks.iter().filter(|t| matches_search(t, query)).collect()
    } else {
        match view {
            View::All => tasks.iter().filter(|t| !t.completed).collect(),
            View::Group(id) => {
                if group_position(groups, id).is_none() {
                    return Vec::new();
                }
                tasks.iter().filter(|t| t.in_group(Some(id))).collect()
            }
            View::Notes | View::Archive => Vec::new(),
        }
    };

    let rank = |t: &Task| {
        t.group_key()
            .and_then(|g| group_position(groups, g))
            .map_or(0, |p| p + 1)
    };
    out.sort_by_key(|t| (rank(*t), t.completed, t.order));
    out
}

/// Counters shown in the sidebar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailyStats {
    pub open_tasks: usize,
    /// Active and archived tasks whose completion falls on the given local day
    pub completed_today: usize,
    pub completed_subtasks: usize,
    pub total_subtasks: usize,
}

pub fn daily_stats(tasks: &[Task], archived: &[Task], day: NaiveDate) -> DailyStats {
    let completed_today = tasks
        .iter()
        .chain(archived)
        .filter_map(|t| t.completed_at)
        .filter(|at| at.with_timezone(&Local).date_naive() == day)
        .count();

    let mut stats = DailyStats {
        open_tasks: tasks.iter().filter(|t| !t.completed).count(),
        completed_today,
        ..Default::default()
    };
    for task in tasks {
        stats.total_subtasks += task.subtasks.len();
        stats.completed_subtasks += task.subtasks.iter().filter(|s| s.completed).count();
    }
    stats
}
