//! Ordered task queue with a forward-only cursor

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::task::{Task, TaskStatus};

/// An ordered sequence of tasks plus the index of the task being worked
///
/// The cursor only ever advances. Once it passes the end the queue is
/// terminal and stays immutable until it is rebuilt from a new plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskQueue {
    tasks: Vec<Task>,
    cursor: usize,
}

impl TaskQueue {
    pub fn new(tasks: Vec<Task>) -> Self {
        debug!(count = tasks.len(), "TaskQueue::new: called");
        Self { tasks, cursor: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Index of the task currently being worked
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// True once the cursor has passed the last task
    pub fn is_terminal(&self) -> bool {
        self.cursor >= self.tasks.len()
    }

    pub fn current(&self) -> Option<&Task> {
        self.tasks.get(self.cursor)
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut Task> {
        self.tasks.get_mut(self.cursor)
    }

    /// Advance the cursor past the current task
    pub(crate) fn advance(&mut self) {
        if self.cursor < self.tasks.len() {
            self.cursor += 1;
        }
        debug!(cursor = self.cursor, total = self.tasks.len(), "TaskQueue::advance");
    }

    /// Read-only view for consumers (workflow engine, UI)
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn has_failures(&self) -> bool {
        self.tasks.iter().any(|t| t.status == TaskStatus::Failed)
    }

    /// Names and reasons of failed tasks, for reporting
    pub fn failures(&self) -> Vec<(String, String)> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .map(|t| {
                (
                    t.name.clone(),
                    t.last_error.clone().unwrap_or_else(|| "unknown failure".to_string()),
                )
            })
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.status == TaskStatus::Completed).count()
    }
}
