use std::time::Duration;

use crate::model::config::{OverlayConfig, ShowMode};
use crate::model::task::Task;

/// Outbound sink for a live overlay (stream overlay, second screen...).
///
/// Called after completion transitions. Whatever a broadcaster does with
/// the data never feeds back into task state.
pub trait Broadcaster: Send {
    /// The current task list
    fn push_task_snapshot(&self, tasks: &[Task]);

    /// A task was just completed
    fn notify_completed(&self, task: &Task);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBroadcaster;

impl Broadcaster for NoopBroadcaster {
    fn push_task_snapshot(&self, _tasks: &[Task]) {}

    fn notify_completed(&self, _task: &Task) {}
}

/// Restricts another broadcaster to the configured stream group.
///
/// Snapshots carry only that group's tasks and completion pulses fire only
/// for its tasks. Without a stream group nothing is forwarded.
#[derive(Debug, Clone)]
pub struct OverlayFilter<B> {
    inner: B,
    stream_group: Option<String>,
    show_mode: ShowMode,
    display: Duration,
}

impl<B: Broadcaster> OverlayFilter<B> {
    pub fn new(inner: B, config: &OverlayConfig) -> Self {
        OverlayFilter {
            inner,
            stream_group: config.stream_group.clone(),
            show_mode: config.show_mode,
            display: Duration::from_secs(config.display_secs),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// How long the overlay stays visible after a completion pulse.
    /// `None` in permanent mode.
    pub fn visibility_window(&self) -> Option<Duration> {
        match self.show_mode {
            ShowMode::Permanent => None,
            ShowMode::Temporary => Some(self.display),
        }
    }

    fn streams(&self, task: &Task) -> bool {
        self.stream_group.is_some() && task.group_id == self.stream_group
    }
}

impl<B: Broadcaster> Broadcaster for OverlayFilter<B> {
    fn push_task_snapshot(&self, tasks: &[Task]) {
        if self.stream_group.is_none() {
            return;
        }
        let streamed: Vec<Task> = tasks.iter().filter(|t| self.streams(t)).cloned().collect();
        self.inner.push_task_snapshot(&streamed);
    }

    fn notify_completed(&self, task: &Task) {
        if self.streams(task) {
            tracing::debug!(task_id = %task.id, "completion forwarded to overlay");
            self.inner.notify_completed(task);
        }
    }
}
