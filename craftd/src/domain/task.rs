//! Task domain type
//!
//! One delegated unit of produce-N-of-item work, tracked by an orchestrator.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for dispatch
    #[default]
    Pending,
    /// Dispatched to the external executor (re-entered across retries)
    InProgress,
    /// Confirmed quantity reached the target
    Completed,
    /// Retries exhausted without reaching the target
    Failed,
    /// Nothing left to produce at dispatch time
    Skipped,
}

impl TaskStatus {
    /// True once the task can never be dispatched again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// One unit of delegated work
///
/// Mutated only by its owning orchestrator. The confirmed quantity is fed by
/// observed inventory deltas and never decreases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Recipe/item identifier (stable identity)
    pub item_id: u32,

    /// Human-readable item name
    pub name: String,

    /// Units requested (plan quantity plus any uniform buffer)
    pub target: u32,

    /// Units confirmed complete via inventory deltas
    pub confirmed: u32,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// Retries consumed so far
    pub retries: u32,

    /// Reason attached to the last failure, if any
    pub last_error: Option<String>,

    /// Executor solver preference applied temporarily for this task
    pub solver: Option<String>,
}

impl Task {
    pub fn new(item_id: u32, name: impl Into<String>, target: u32) -> Self {
        let name = name.into();
        debug!(item_id, %name, target, "Task::new: called");
        Self {
            item_id,
            name,
            target,
            confirmed: 0,
            status: TaskStatus::Pending,
            retries: 0,
            last_error: None,
            solver: None,
        }
    }

    /// Builder method to set a solver preference
    pub fn with_solver(mut self, solver: impl Into<String>) -> Self {
        self.solver = Some(solver.into());
        self
    }

    /// Units still outstanding (floor 0)
    pub fn remaining(&self) -> u32 {
        self.target.saturating_sub(self.confirmed)
    }

    /// Credit observed progress; the confirmed quantity only ever grows
    pub fn record_progress(&mut self, delta: u32) {
        debug!(item_id = self.item_id, delta, confirmed = self.confirmed, "Task::record_progress");
        self.confirmed = self.confirmed.saturating_add(delta);
    }

    pub fn mark_in_progress(&mut self) {
        debug!(item_id = self.item_id, "Task::mark_in_progress");
        self.status = TaskStatus::InProgress;
    }

    pub fn mark_completed(&mut self) {
        debug!(item_id = self.item_id, confirmed = self.confirmed, "Task::mark_completed");
        self.status = TaskStatus::Completed;
    }

    pub fn mark_skipped(&mut self) {
        debug!(item_id = self.item_id, "Task::mark_skipped");
        self.status = TaskStatus::Skipped;
    }

    /// Terminal failure; the reason must be non-empty
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        debug_assert!(!reason.is_empty(), "failure reason must be non-empty");
        debug!(item_id = self.item_id, %reason, "Task::mark_failed");
        self.status = TaskStatus::Failed;
        self.last_error = Some(reason);
    }
}
