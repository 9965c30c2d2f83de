use crate::model::tag::{Tag, TagColor};
use crate::model::task::{Task, find_task_mut};

/// Add a tag to the global tag set. Returns its id.
pub fn add_tag(tags: &mut Vec<Tag>, name: String, color: TagColor) -> String {
    let tag = Tag::new(name, color);
    let id = tag.id.clone();
    tags.push(tag);
    id
}

/// Rename and/or recolour a tag. `None` leaves a field as is.
pub fn update_tag(
    tags: &mut [Tag],
    tag_id: &str,
    name: Option<String>,
    color: Option<TagColor>,
) -> bool {
    let Some(tag) = tags.iter_mut().find(|t| t.id == tag_id) else {
        return false;
    };
    if let Some(name) = name {
        tag.name = name;
    }
    if let Some(color) = color {
        tag.color = color;
    }
    true
}

/// Delete a tag and strip its id from every task in every collection given.
pub fn delete_tag(tags: &mut Vec<Tag>, collections: &mut [&mut Vec<Task>], tag_id: &str) -> bool {
    let before = tags.len();
    tags.retain(|t| t.id != tag_id);
    if tags.len() == before {
        return false;
    }
    for tasks in collections.iter_mut() {
        for task in tasks.iter_mut() {
            task.tags.retain(|t| t != tag_id);
        }
    }
    true
}

/// Attach a known tag to a task. Unknown tags and duplicates are ignored.
pub fn add_task_tag(tasks: &mut [Task], tags: &[Tag], task_id: &str, tag_id: &str) -> bool {
    if !tags.iter().any(|t| t.id == tag_id) {
        return false;
    }
    let Some(task) = find_task_mut(tasks, task_id) else {
        return false;
    };
    if task.tags.iter().any(|t| t == tag_id) {
        return false;
    }
    task.tags.push(tag_id.to_string());
    true
}

pub fn remove_task_tag(tasks: &mut [Task], task_id: &str, tag_id: &str) -> bool {
    let Some(task) = find_task_mut(tasks, task_id) else {
        return false;
    };
    let before = task.tags.len();
    task.tags.retain(|t| t != tag_id);
    task.tags.len() != before
}

/// Replace a task's tag set. Unknown tag ids and duplicates are dropped.
pub fn set_task_tags(tasks: &mut [Task], tags: &[Tag], task_id: &str, tag_ids: &[String]) -> bool {
    let Some(task) = find_task_mut(tasks, task_id) else {
        return false;
    };
    let mut next: Vec<String> = Vec::with_capacity(tag_ids.len());
    for id in tag_ids {
        if tags.iter().any(|t| &t.id == id) && !next.contains(id) {
            next.push(id.clone());
        }
    }
    task.tags = next;
    true
}

/// Drop tag references that point at tags no longer in the tag set.
/// Returns the number of references removed.
pub fn prune_dangling_tags(tasks: &mut [Task], tags: &[Tag]) -> usize {
    let mut removed = 0;
    for task in tasks.iter_mut() {
        let before = task.tags.len();
        task.tags.retain(|id| tags.iter().any(|t| &t.id == id));
        removed += before - task.tags.len();
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::find_task;
    use crate::ops::test_support::normalized_board;

    #[test]
    fn test_add_update_tag() {
        let mut tags = Vec::new();
        let id = add_tag(&mut tags, "bug".into(), TagColor::Red);
        assert!(update_tag(&mut tags, &id, None, Some(TagColor::Blue)));
        assert_eq!(tags[0].name, "bug");
        assert_eq!(tags[0].color, TagColor::Blue);
        assert!(!update_tag(&mut tags, "nope", Some("x".into()), None));
    }

    #[test]
    fn test_task_tags_only_accept_known_ids() {
        let mut tags = Vec::new();
        let bug = add_tag(&mut tags, "bug".into(), TagColor::Red);
        let mut tasks = normalized_board(&[("A", None, false)]);

        assert!(add_task_tag(&mut tasks, &tags, "A", &bug));
        assert!(!add_task_tag(&mut tasks, &tags, "A", &bug));
        assert!(!add_task_tag(&mut tasks, &tags, "A", "ghost"));
        assert_eq!(find_task(&tasks, "A").unwrap().tags, vec![bug.clone()]);

        assert!(set_task_tags(
            &mut tasks,
            &tags,
            "A",
            &["ghost".to_string(), bug.clone(), bug.clone()]
        ));
        assert_eq!(find_task(&tasks, "A").unwrap().tags, vec![bug.clone()]);

        assert!(remove_task_tag(&mut tasks, "A", &bug));
        assert!(find_task(&tasks, "A").unwrap().tags.is_empty());
    }

    #[test]
    fn test_delete_tag_strips_references_everywhere() {
        let mut tags = Vec::new();
        let bug = add_tag(&mut tags, "bug".into(), TagColor::Red);
        let keep = add_tag(&mut tags, "keep".into(), TagColor::Green);
        let mut tasks = normalized_board(&[("A", None, false)]);
        let mut archived = normalized_board(&[("Z", None, true)]);
        tasks[0].tags = vec![bug.clone(), keep.clone()];
        archived[0].tags = vec![bug.clone()];

        assert!(delete_tag(&mut tags, &mut [&mut tasks, &mut archived], &bug));
        assert_eq!(tasks[0].tags, vec![keep]);
        assert!(archived[0].tags.is_empty());
        assert!(!delete_tag(&mut tags, &mut [&mut tasks], &bug));
    }

    #[test]
    fn test_prune_dangling_tags() {
        let tags = vec![Tag::new("x".into(), TagColor::Pink)];
        let mut tasks = normalized_board(&[("A", None, false)]);
        tasks[0].tags = vec![tags[0].id.clone(), "gone".into()];
        assert_eq!(prune_dangling_tags(&mut tasks, &tags), 1);
        assert_eq!(tasks[0].tags, vec![tags[0].id.clone()]);
    }
}
