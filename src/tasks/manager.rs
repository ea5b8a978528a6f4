//! Tracker for task progress channels, polled by the web layer.

use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Instant;

use serde::Serialize;

use super::{TaskId, TaskKind, TaskProgress, TaskState, TaskUpdate};

struct TrackedTask {
    kind: TaskKind,
    state: TaskState,
    progress: Option<TaskProgress>,
    message: Option<String>,
    receiver: mpsc::Receiver<TaskUpdate>,
    started_at: Instant,
}

impl TrackedTask {
    fn drain(&mut self) {
        while let Ok(update) = self.receiver.try_recv() {
            match update {
                TaskUpdate::Started { total } => {
                    self.progress = Some(TaskProgress::new(0, total));
                }
                TaskUpdate::Progress(progress) => {
                    self.message = progress.message.clone();
                    self.progress = Some(progress);
                }
                TaskUpdate::Completed { message } => {
                    self.state = TaskState::Completed;
                    self.message = Some(message);
                }
                TaskUpdate::Failed { error } => {
                    self.message = Some(error.clone());
                    self.state = TaskState::Failed(error);
                }
            }
        }
    }
}

/// Snapshot answered to a progress poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressStatus {
    pub task_id: TaskId,
    pub kind: TaskKind,
    /// `running`, `complete` or `error`.
    pub status: &'static str,
    pub progress: u8,
    pub current: usize,
    pub total: usize,
    pub message: Option<String>,
    pub current_item: Option<String>,
    pub elapsed_secs: f64,
}

/// Keeps one receiver per registered task. Finished tasks stay queryable
/// until the id is registered again or [`ProgressTracker::forget_finished`]
/// runs.
#[derive(Default)]
pub struct ProgressTracker {
    tasks: HashMap<TaskId, TrackedTask>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` and return the sender the work should report into.
    /// Re-registering an id replaces the previous task.
    pub fn register(&mut self, id: TaskId, kind: TaskKind) -> mpsc::Sender<TaskUpdate> {
        let (tx, rx) = mpsc::channel();
        self.tasks.insert(
            id,
            TrackedTask {
                kind,
                state: TaskState::Running,
                progress: None,
                message: None,
                receiver: rx,
                started_at: Instant::now(),
            },
        );
        tx
    }

    /// Drain every channel.
    pub fn poll_updates(&mut self) {
        for task in self.tasks.values_mut() {
            task.drain();
        }
    }

    pub fn status(&mut self, id: &TaskId) -> Option<ProgressStatus> {
        let task = self.tasks.get_mut(id)?;
        task.drain();

        let (current, total) = task
            .progress
            .as_ref()
            .map(|p| (p.current, p.total))
            .unwrap_or((0, 0));
        let (status, progress) = match &task.state {
            TaskState::Running => ("running", task.progress.as_ref().map_or(0, |p| p.percent())),
            TaskState::Completed => ("complete", 100),
            TaskState::Failed(_) => ("error", 100),
        };

        Some(ProgressStatus {
            task_id: id.clone(),
            kind: task.kind,
            status,
            progress,
            current,
            total,
            message: task.message.clone(),
            current_item: task.progress.as_ref().and_then(|p| p.current_item.clone()),
            elapsed_secs: task.started_at.elapsed().as_secs_f64(),
        })
    }

    pub fn running_count(&mut self) -> usize {
        self.poll_updates();
        self.tasks
            .values()
            .filter(|t| t.state == TaskState::Running)
            .count()
    }

    /// Drop finished tasks, returning how many were removed.
    pub fn forget_finished(&mut self) -> usize {
        self.poll_updates();
        let before = self.tasks.len();
        self.tasks.retain(|_, t| t.state == TaskState::Running);
        before - self.tasks.len()
    }
}
