//! Progress reporting for long-running work.
//!
//! Work functions take a `&dyn ProgressSink` and push [`TaskUpdate`]s into
//! it; the web layer hands them a channel sender registered with the
//! [`ProgressTracker`] and answers progress polls from the receiving end.

pub mod manager;

use std::sync::mpsc;

use serde::Serialize;

pub use manager::{ProgressStatus, ProgressTracker};

/// Identifier a client uses to poll progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    /// Server-generated id for requests that did not supply one.
    pub fn generate(kind: TaskKind) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        TaskId(format!("{}-{}", kind.as_str(), COUNTER.fetch_add(1, Ordering::SeqCst)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Analyze,
    Wrapped,
    Extract,
    Crawl,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Analyze => "analyze",
            TaskKind::Wrapped => "wrapped",
            TaskKind::Extract => "extract",
            TaskKind::Crawl => "crawl",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TaskKind::Analyze => "Analysis",
            TaskKind::Wrapped => "Monthly Trends",
            TaskKind::Extract => "Metadata Extraction",
            TaskKind::Crawl => "Folder Crawl",
        }
    }
}

/// Progress information for a task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskProgress {
    pub current: usize,
    pub total: usize,
    pub current_item: Option<String>,
    pub message: Option<String>,
}

impl TaskProgress {
    pub fn new(current: usize, total: usize) -> Self {
        Self {
            current,
            total,
            current_item: None,
            message: None,
        }
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.current_item = Some(item.into());
        self
    }

    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Calculate progress percentage (0-100).
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            0
        } else {
            ((self.current as f64 / self.total as f64) * 100.0).min(100.0) as u8
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Running,
    Completed,
    Failed(String),
}

/// Update messages sent by running work.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskUpdate {
    Started { total: usize },
    Progress(TaskProgress),
    Completed { message: String },
    Failed { error: String },
}

/// Receiver of progress updates.
pub trait ProgressSink {
    fn send(&self, update: TaskUpdate);

    fn started(&self, total: usize) {
        self.send(TaskUpdate::Started { total });
    }

    fn progress(&self, current: usize, total: usize, message: &str) {
        self.send(TaskUpdate::Progress(
            TaskProgress::new(current, total).with_message(message),
        ));
    }

    fn completed(&self, message: &str) {
        self.send(TaskUpdate::Completed {
            message: message.to_string(),
        });
    }

    fn failed(&self, error: &str) {
        self.send(TaskUpdate::Failed {
            error: error.to_string(),
        });
    }
}

/// A disconnected receiver only means nobody is polling any more.
impl ProgressSink for mpsc::Sender<TaskUpdate> {
    fn send(&self, update: TaskUpdate) {
        let _ = mpsc::Sender::send(self, update);
    }
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn send(&self, _update: TaskUpdate) {}
}
