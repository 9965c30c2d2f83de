//! The application controller.
//!
//! [`Store`] owns the in-memory [`AppState`]. Every mutation method applies
//! one operation from [`crate::ops`], saves the collections it touched
//! through the [`Storage`] collaborator and then notifies subscribers.
//! Saves are fire-and-forget: a failed save is logged and the in-memory
//! state stays as it is.

pub mod broadcast;
pub mod events;
pub mod focus;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::io::migrate::{Migrated, migrate_archived, migrate_groups, migrate_notes, migrate_tags, migrate_tasks};
use crate::io::storage::{Collection, Storage, StorageError};
use crate::model::config::FocusConfig;
use crate::model::focus::{FocusSession, FocusTarget};
use crate::model::group::Group;
use crate::model::note::Note;
use crate::model::tag::{Tag, TagColor};
use crate::model::task::{Task, find_task};
use crate::ops::move_ops::{DragEnd, DragMove};
use crate::ops::query::{DailyStats, View};
use crate::ops::{completion, group_ops, move_ops, note_ops, query, tag_ops, task_ops};

use self::broadcast::{Broadcaster, NoopBroadcaster};
use self::events::{StoreEvent, Subscribers, SubscriptionId};
use self::focus::Ticker;

/// Everything the app persists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub groups: Vec<Group>,
    /// Flat task collection, laid out group by group
    pub tasks: Vec<Task>,
    pub tags: Vec<Tag>,
    pub notes: Vec<Note>,
    pub archived_tasks: Vec<Task>,
}

/// Hand a collection's unreadable values to `storage` and return its records.
fn keep<T>(storage: &dyn Storage, collection: Collection, migrated: Migrated<T>) -> Vec<T> {
    if let Err(e) = storage.preserve(collection, &migrated.unreadable) {
        tracing::warn!(%collection, error = %e, "could not preserve unreadable values");
    }
    migrated.records
}

pub struct Store {
    state: AppState,
    storage: Box<dyn Storage>,
    broadcaster: Box<dyn Broadcaster>,
    subscribers: Subscribers,
    focus: FocusSession,
    focus_config: FocusConfig,
    ticker: Ticker,
    view: View,
    search: String,
}

impl Store {
    /// An empty store. Nothing is read from `storage`.
    pub fn new(storage: Box<dyn Storage>, focus_config: FocusConfig) -> Self {
        Self::with_state(AppState::default(), storage, focus_config)
    }

    fn with_state(state: AppState, storage: Box<dyn Storage>, focus_config: FocusConfig) -> Self {
        Store {
            state,
            storage,
            broadcaster: Box::new(NoopBroadcaster),
            subscribers: Subscribers::new(),
            focus: FocusSession::new(focus_config.duration_secs),
            focus_config,
            ticker: Ticker::per_second(),
            view: View::default(),
            search: String::new(),
        }
    }

    /// Load every collection from `storage`, migrating older records.
    ///
    /// A collection that cannot be read starts empty; the error is logged.
    /// Stored values that are not records are handed back to the storage
    /// through [`Storage::preserve`] before anything is saved over them.
    pub fn load(storage: Box<dyn Storage>, focus_config: FocusConfig) -> Self {
        let now = Utc::now();
        let read = |collection: Collection| match storage.load(collection) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%collection, error = %e, "could not load collection, starting empty");
                None
            }
        };

        let groups = read(Collection::Groups).flatten();
        let tasks = read(Collection::Tasks).flatten();
        let tags = read(Collection::Tags);
        let notes = read(Collection::Notes).flatten();
        let archived = read(Collection::ArchivedTasks).flatten();

        // Task tag references are only pruned against a tag list that loaded whole.
        let tags = tags.map(migrate_tags);
        let tags_readable = tags.as_ref().is_some_and(|t| t.unreadable.is_empty());
        let tags = tags.unwrap_or_else(|| migrate_tags(None));

        let mut state = AppState {
            groups: keep(&*storage, Collection::Groups, migrate_groups(groups, now)),
            tasks: keep(&*storage, Collection::Tasks, migrate_tasks(tasks, now)),
            tags: keep(&*storage, Collection::Tags, tags),
            notes: keep(&*storage, Collection::Notes, migrate_notes(notes, now)),
            archived_tasks: keep(&*storage, Collection::ArchivedTasks, migrate_archived(archived, now)),
        };
        if tags_readable {
            let pruned = tag_ops::prune_dangling_tags(&mut state.tasks, &state.tags)
                + tag_ops::prune_dangling_tags(&mut state.archived_tasks, &state.tags);
            if pruned > 0 {
                tracing::info!(pruned, "removed references to deleted tags");
            }
        }
        tracing::info!(
            groups = state.groups.len(),
            tasks = state.tasks.len(),
            tags = state.tags.len(),
            notes = state.notes.len(),
            archived = state.archived_tasks.len(),
            "store loaded"
        );
        Self::with_state(state, storage, focus_config)
    }

    pub fn set_broadcaster(&mut self, broadcaster: Box<dyn Broadcaster>) {
        self.broadcaster = broadcaster;
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn groups(&self) -> &[Group] {
        &self.state.groups
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn tags(&self) -> &[Tag] {
        &self.state.tags
    }

    pub fn notes(&self) -> &[Note] {
        &self.state.notes
    }

    pub fn archived_tasks(&self) -> &[Task] {
        &self.state.archived_tasks
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        find_task(&self.state.tasks, task_id)
    }

    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.state.notes.iter().find(|n| n.id == note_id)
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Tasks for the current view and search query
    pub fn visible_tasks(&self) -> Vec<&Task> {
        query::visible_tasks(&self.state.tasks, &self.state.groups, &self.view, &self.search)
    }

    pub fn daily_stats(&self, day: NaiveDate) -> DailyStats {
        query::daily_stats(&self.state.tasks, &self.state.archived_tasks, day)
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + Send + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // -----------------------------------------------------------------------
    // View
    // -----------------------------------------------------------------------

    pub fn set_view(&mut self, view: View) {
        self.view = view;
        self.subscribers.emit(&StoreEvent::View);
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
        self.subscribers.emit(&StoreEvent::View);
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    pub fn add_group(&mut self, name: impl Into<String>) -> String {
        let id = group_ops::add_group(&mut self.state.groups, name.into(), Utc::now());
        self.commit(&[Collection::Groups]);
        id
    }

    pub fn rename_group(&mut self, group_id: &str, name: impl Into<String>) -> bool {
        let changed = group_ops::rename_group(&mut self.state.groups, group_id, name.into());
        self.commit_if(changed, "rename_group", group_id, &[Collection::Groups])
    }

    /// Delete a group. Its tasks become ungrouped.
    pub fn delete_group(&mut self, group_id: &str) -> bool {
        let changed = group_ops::delete_group(&mut self.state.groups, &mut self.state.tasks, group_id);
        if changed && self.view == View::Group(group_id.to_string()) {
            self.view = View::All;
        }
        self.commit_if(changed, "delete_group", group_id, &[Collection::Groups, Collection::Tasks])
    }

    pub fn move_group(&mut self, source_index: usize, dest_index: usize) -> bool {
        let changed = group_ops::move_group(&mut self.state.groups, source_index, dest_index);
        self.commit_if(changed, "move_group", "", &[Collection::Groups])
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Create an active task at the end of the group's active run.
    pub fn add_task(&mut self, title: impl Into<String>, group_id: Option<String>) -> String {
        let id = task_ops::add_task(&mut self.state.tasks, title.into(), group_id, Utc::now());
        self.commit(&[Collection::Tasks]);
        id
    }

    pub fn edit_task_title(&mut self, task_id: &str, title: impl Into<String>) -> bool {
        let changed = task_ops::edit_title(&mut self.state.tasks, task_id, title.into());
        self.commit_if(changed, "edit_task_title", task_id, &[Collection::Tasks])
    }

    pub fn delete_task(&mut self, task_id: &str) -> bool {
        let changed = task_ops::delete_task(&mut self.state.tasks, task_id).is_some();
        if changed {
            self.drop_focus_on_missing();
        }
        self.commit_if(changed, "delete_task", task_id, &[Collection::Tasks])
    }

    /// Mark a task completed or active. Setting the state a task already
    /// has changes nothing. The broadcaster hears about every transition.
    pub fn set_task_completed(&mut self, task_id: &str, completed: bool) -> bool {
        let Some(task) = self.task(task_id) else {
            tracing::debug!(task_id, "set_task_completed ignored: task not found");
            return false;
        };
        if task.completed == completed {
            return false;
        }

        let tasks = std::mem::take(&mut self.state.tasks);
        self.state.tasks = completion::set_completed(tasks, task_id, completed, Utc::now());
        self.commit(&[Collection::Tasks]);

        self.broadcaster.push_task_snapshot(&self.state.tasks);
        if completed && let Some(task) = find_task(&self.state.tasks, task_id) {
            self.broadcaster.notify_completed(task);
        }
        true
    }

    pub fn toggle_task_completed(&mut self, task_id: &str) -> bool {
        match self.task(task_id).map(|t| t.completed) {
            Some(completed) => self.set_task_completed(task_id, !completed),
            None => false,
        }
    }

    /// Apply a board drag-end event.
    pub fn drag_end(&mut self, event: &DragEnd) -> bool {
        match event.resolve() {
            Some(mv) => self.move_task(&mv),
            None => false,
        }
    }

    /// Move a task to a position in a (possibly different) group.
    pub fn move_task(&mut self, mv: &DragMove) -> bool {
        if self.task(&mv.task_id).is_none() {
            tracing::debug!(task_id = %mv.task_id, "move_task ignored: task not found");
            return false;
        }
        let tasks = std::mem::take(&mut self.state.tasks);
        self.state.tasks = move_ops::move_task(tasks, mv);
        self.commit(&[Collection::Tasks]);
        true
    }

    /// Move a task within its own group.
    pub fn reorder_task(&mut self, task_id: &str, dest_index: usize) -> bool {
        if self.task(task_id).is_none() {
            return false;
        }
        let tasks = std::mem::take(&mut self.state.tasks);
        self.state.tasks = move_ops::reorder_task(tasks, task_id, dest_index);
        self.commit(&[Collection::Tasks]);
        true
    }

    // -----------------------------------------------------------------------
    // Description entries
    // -----------------------------------------------------------------------

    pub fn add_description_entry(&mut self, task_id: &str, text: impl Into<String>) -> Option<String> {
        let id = task_ops::add_description_entry(&mut self.state.tasks, task_id, text.into(), Utc::now());
        self.commit_if(id.is_some(), "add_description_entry", task_id, &[Collection::Tasks]);
        id
    }

    pub fn edit_description_entry(&mut self, task_id: &str, entry_id: &str, text: impl Into<String>) -> bool {
        let changed =
            task_ops::edit_description_entry(&mut self.state.tasks, task_id, entry_id, text.into(), Utc::now());
        self.commit_if(changed, "edit_description_entry", entry_id, &[Collection::Tasks])
    }

    pub fn delete_description_entry(&mut self, task_id: &str, entry_id: &str) -> bool {
        let changed = task_ops::delete_description_entry(&mut self.state.tasks, task_id, entry_id);
        self.commit_if(changed, "delete_description_entry", entry_id, &[Collection::Tasks])
    }

    // -----------------------------------------------------------------------
    // Subtasks
    // -----------------------------------------------------------------------

    pub fn add_subtask(&mut self, task_id: &str, title: impl Into<String>) -> Option<String> {
        let id = task_ops::add_subtask(&mut self.state.tasks, task_id, title.into());
        self.commit_if(id.is_some(), "add_subtask", task_id, &[Collection::Tasks]);
        id
    }

    pub fn rename_subtask(&mut self, task_id: &str, subtask_id: &str, title: impl Into<String>) -> bool {
        let changed = task_ops::rename_subtask(&mut self.state.tasks, task_id, subtask_id, title.into());
        self.commit_if(changed, "rename_subtask", subtask_id, &[Collection::Tasks])
    }

    pub fn set_subtask_completed(&mut self, task_id: &str, subtask_id: &str, completed: bool) -> bool {
        let changed = task_ops::set_subtask_completed(&mut self.state.tasks, task_id, subtask_id, completed);
        self.commit_if(changed, "set_subtask_completed", subtask_id, &[Collection::Tasks])
    }

    pub fn delete_subtask(&mut self, task_id: &str, subtask_id: &str) -> bool {
        let changed = task_ops::delete_subtask(&mut self.state.tasks, task_id, subtask_id);
        self.commit_if(changed, "delete_subtask", subtask_id, &[Collection::Tasks])
    }

    pub fn move_subtask(&mut self, task_id: &str, source_index: usize, dest_index: usize) -> bool {
        let changed = task_ops::move_subtask(&mut self.state.tasks, task_id, source_index, dest_index);
        self.commit_if(changed, "move_subtask", task_id, &[Collection::Tasks])
    }

    // -----------------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------------

    pub fn add_tag(&mut self, name: impl Into<String>, color: TagColor) -> String {
        let id = tag_ops::add_tag(&mut self.state.tags, name.into(), color);
        self.commit(&[Collection::Tags]);
        id
    }

    pub fn update_tag(&mut self, tag_id: &str, name: Option<String>, color: Option<TagColor>) -> bool {
        let changed = tag_ops::update_tag(&mut self.state.tags, tag_id, name, color);
        self.commit_if(changed, "update_tag", tag_id, &[Collection::Tags])
    }

    /// Delete a tag and remove it from every live and archived task.
    pub fn delete_tag(&mut self, tag_id: &str) -> bool {
        let AppState {
            tags,
            tasks,
            archived_tasks,
            ..
        } = &mut self.state;
        let changed = tag_ops::delete_tag(tags, &mut [tasks, archived_tasks], tag_id);
        self.commit_if(
            changed,
            "delete_tag",
            tag_id,
            &[Collection::Tags, Collection::Tasks, Collection::ArchivedTasks],
        )
    }

    pub fn add_task_tag(&mut self, task_id: &str, tag_id: &str) -> bool {
        let changed = tag_ops::add_task_tag(&mut self.state.tasks, &self.state.tags, task_id, tag_id);
        self.commit_if(changed, "add_task_tag", task_id, &[Collection::Tasks])
    }

    pub fn remove_task_tag(&mut self, task_id: &str, tag_id: &str) -> bool {
        let changed = tag_ops::remove_task_tag(&mut self.state.tasks, task_id, tag_id);
        self.commit_if(changed, "remove_task_tag", task_id, &[Collection::Tasks])
    }

    pub fn set_task_tags(&mut self, task_id: &str, tag_ids: &[String]) -> bool {
        let changed = tag_ops::set_task_tags(&mut self.state.tasks, &self.state.tags, task_id, tag_ids);
        self.commit_if(changed, "set_task_tags", task_id, &[Collection::Tasks])
    }

    // -----------------------------------------------------------------------
    // Archive
    // -----------------------------------------------------------------------

    /// Move all completed tasks to the archive. Returns how many moved.
    pub fn archive_completed(&mut self) -> usize {
        let moved = task_ops::archive_completed(&mut self.state.tasks, &mut self.state.archived_tasks);
        if moved > 0 {
            self.drop_focus_on_missing();
            tracing::info!(moved, "archived completed tasks");
            self.commit(&[Collection::Tasks, Collection::ArchivedTasks]);
        }
        moved
    }

    /// Bring an archived task back as an active task.
    pub fn restore_archived(&mut self, task_id: &str) -> bool {
        let AppState {
            groups,
            tasks,
            archived_tasks,
            ..
        } = &mut self.state;
        let changed = task_ops::restore_archived(archived_tasks, tasks, task_id, |g| {
            groups.iter().any(|group| group.id == g)
        });
        self.commit_if(
            changed,
            "restore_archived",
            task_id,
            &[Collection::Tasks, Collection::ArchivedTasks],
        )
    }

    // -----------------------------------------------------------------------
    // Notes
    // -----------------------------------------------------------------------

    pub fn add_note(&mut self, title: impl Into<String>, content: impl Into<String>) -> String {
        let id = note_ops::add_note(&mut self.state.notes, title.into(), content.into(), Utc::now());
        self.commit(&[Collection::Notes]);
        id
    }

    pub fn update_note(&mut self, note_id: &str, title: Option<String>, content: Option<String>) -> bool {
        let changed = note_ops::update_note(&mut self.state.notes, note_id, title, content);
        self.commit_if(changed, "update_note", note_id, &[Collection::Notes])
    }

    pub fn delete_note(&mut self, note_id: &str) -> bool {
        let changed = note_ops::delete_note(&mut self.state.notes, note_id).is_some();
        if changed {
            self.drop_focus_on_missing();
        }
        self.commit_if(changed, "delete_note", note_id, &[Collection::Notes])
    }

    /// Turn a note into a task in `group_id`. Returns the new task id.
    pub fn convert_note_to_task(&mut self, note_id: &str, group_id: Option<String>) -> Option<String> {
        let id = note_ops::convert_note_to_task(
            &mut self.state.notes,
            &mut self.state.tasks,
            note_id,
            group_id,
            Utc::now(),
        );
        if let Some(task_id) = &id
            && self.focus.target == FocusTarget::Note(note_id.to_string())
        {
            self.focus.target = FocusTarget::Task(task_id.clone());
        }
        self.commit_if(
            id.is_some(),
            "convert_note_to_task",
            note_id,
            &[Collection::Notes, Collection::Tasks],
        );
        id
    }

    // -----------------------------------------------------------------------
    // Focus mode
    // -----------------------------------------------------------------------

    pub fn focus(&self) -> &FocusSession {
        &self.focus
    }

    pub fn focus_task(&self) -> Option<&Task> {
        match &self.focus.target {
            FocusTarget::Task(id) => self.task(id),
            _ => None,
        }
    }

    pub fn focus_note(&self) -> Option<&Note> {
        match &self.focus.target {
            FocusTarget::Note(id) => self.note(id),
            _ => None,
        }
    }

    /// Open focus mode. A task or note target that does not exist is a no-op.
    pub fn start_focus(&mut self, target: FocusTarget) -> bool {
        let exists = match &target {
            FocusTarget::Task(id) => self.task(id).is_some(),
            FocusTarget::Note(id) => self.note(id).is_some(),
            FocusTarget::Empty => true,
        };
        if !exists {
            tracing::debug!(?target, "start_focus ignored: target not found");
            return false;
        }
        self.focus.start(target, self.focus_config.duration_secs);
        // Always a fresh tick source for a fresh session
        self.ticker.stop();
        self.focus_changed();
        true
    }

    pub fn stop_focus(&mut self) {
        self.focus.stop();
        self.focus_changed();
    }

    pub fn minimize_focus(&mut self) {
        self.focus.minimize();
        self.focus_changed();
    }

    pub fn restore_focus(&mut self) {
        self.focus.restore();
        self.focus_changed();
    }

    pub fn toggle_focus_timer(&mut self) {
        self.focus.toggle_timer();
        self.focus_changed();
    }

    /// Add the configured extension to the countdown.
    pub fn extend_focus(&mut self) {
        if !self.focus.active {
            return;
        }
        self.focus.timer.extend(self.focus_config.extend_secs);
        self.focus_changed();
    }

    /// Change the countdown length. Resets and pauses the timer.
    pub fn set_focus_duration(&mut self, secs: u64) {
        self.focus.timer.set_duration(secs);
        self.focus_config.duration_secs = self.focus.timer.duration;
        self.focus_changed();
    }

    /// Advance the countdown by one second. Returns true if it just finished.
    pub fn focus_tick(&mut self) -> bool {
        if !self.focus.wants_ticks() {
            return false;
        }
        let finished = self.focus.timer.tick();
        if finished {
            tracing::info!("focus session finished");
            self.ticker.stop();
            self.subscribers.emit(&StoreEvent::FocusFinished);
        }
        finished
    }

    /// Apply the ticks the background ticker produced since the last call.
    /// Returns true if the countdown finished.
    pub fn pump_focus(&mut self) -> bool {
        let ticks = self.ticker.poll();
        (0..ticks).any(|_| self.focus_tick())
    }

    fn focus_changed(&mut self) {
        self.sync_ticker();
        self.subscribers.emit(&StoreEvent::Focus);
    }

    /// Run the ticker exactly while the session wants ticks.
    fn sync_ticker(&mut self) {
        match (self.focus.wants_ticks(), self.ticker.is_running()) {
            (true, false) => self.ticker.start(),
            (false, true) => self.ticker.stop(),
            _ => {}
        }
    }

    fn drop_focus_on_missing(&mut self) {
        let gone = match &self.focus.target {
            FocusTarget::Task(id) => find_task(&self.state.tasks, id).is_none(),
            FocusTarget::Note(id) => !self.state.notes.iter().any(|n| &n.id == id),
            FocusTarget::Empty => false,
        };
        if self.focus.active && gone {
            self.stop_focus();
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Wait until every queued save has been written.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.storage.flush()
    }

    fn commit(&mut self, touched: &[Collection]) {
        for &collection in touched {
            self.persist(collection);
        }
        self.subscribers.emit(&StoreEvent::Changed(touched.to_vec()));
    }

    /// Commit when `changed`, otherwise log the ignored call. Returns `changed`.
    fn commit_if(&mut self, changed: bool, op: &str, id: &str, touched: &[Collection]) -> bool {
        if changed {
            self.commit(touched);
        } else {
            tracing::debug!(op, id, "ignored: nothing to change");
        }
        changed
    }

    fn persist(&self, collection: Collection) {
        let value = match collection {
            Collection::Groups => to_value(collection, &self.state.groups),
            Collection::Tasks => to_value(collection, &self.state.tasks),
            Collection::Tags => to_value(collection, &self.state.tags),
            Collection::Notes => to_value(collection, &self.state.notes),
            Collection::ArchivedTasks => to_value(collection, &self.state.archived_tasks),
        };
        let result = value.and_then(|value| self.storage.save(collection, &value));
        if let Err(e) = result {
            tracing::warn!(%collection, error = %e, "could not save collection");
        }
    }
}

fn to_value<T: Serialize>(collection: Collection, items: &[T]) -> Result<serde_json::Value, StorageError> {
    serde_json::to_value(items).map_err(|e| StorageError::SerializeError { collection, source: e })
}

impl Drop for Store {
    fn drop(&mut self) {
        if let Err(e) = self.storage.flush() {
            tracing::warn!(error = %e, "could not flush pending saves");
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("focus", &self.focus)
            .field("view", &self.view)
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}
