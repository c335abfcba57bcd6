//! TaskOrchestrator - drives a task queue through an external executor
//!
//! The executor's busy flag is the only completion callback available; it
//! says nothing about how much was produced, or whether the intended item was
//! produced at all. The before/after inventory-count delta is therefore the
//! only progress oracle, and every retry and failure decision keys off it.
//!
//! Delayed work (retry after 3 s, settle 2 s between tasks) is held in a
//! single [`ScheduledAction`] slot consumed on the tick path, so at most one
//! delayed continuation can ever be outstanding and a `stop()` simply clears
//! the slot.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::collab::{InventoryReader, JobExecutor};
use crate::domain::{PlanStep, Task, TaskQueue};
use crate::events::EventEmitter;

use super::OrchestratorConfig;

/// State of the orchestrator as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestratorState {
    /// No queue, or stopped
    #[default]
    Idle,
    /// A queue exists but has not started
    Ready,
    /// A dispatch to the external executor is outstanding or about to be made
    Running,
    /// The cursor passed the end of the queue
    Completed,
    /// Unrecoverable orchestrator-level failure
    Error,
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Ready => write!(f, "ready"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Why a delayed dispatch was scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScheduledKind {
    /// Re-instruct the executor for the current task's shortfall
    Redispatch,
    /// Settle delay elapsed; dispatch the next task
    StartNext,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledAction {
    due_ms: u64,
    kind: ScheduledKind,
}

/// Drives one task queue to completion through an external executor
pub struct TaskOrchestrator {
    /// Source label for logs and events ("craft", "gather")
    label: String,

    config: OrchestratorConfig,
    executor: Arc<dyn JobExecutor>,
    inventory: Arc<dyn InventoryReader>,
    clock: Arc<dyn Clock>,
    emitter: EventEmitter,

    state: OrchestratorState,
    queue: TaskQueue,

    /// A dispatch is outstanding; polls watch for the executor to go idle
    awaiting_executor: bool,

    /// Inventory count observed immediately before the live dispatch
    baseline: u32,

    /// Last busy-flag poll, for the rate-limit gate
    last_poll_ms: Option<u64>,

    /// The single outstanding delayed action, if any
    scheduled: Option<ScheduledAction>,

    /// Item whose solver override is currently applied, if any
    solver_applied: Option<u32>,

    status: String,
}

impl TaskOrchestrator {
    pub fn new(
        label: impl Into<String>,
        executor: Arc<dyn JobExecutor>,
        inventory: Arc<dyn InventoryReader>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let label = label.into();
        debug!(%label, "TaskOrchestrator::new: called");
        let emitter = EventEmitter::disconnected(&label);
        Self {
            label,
            config: OrchestratorConfig::default(),
            executor,
            inventory,
            clock,
            emitter,
            state: OrchestratorState::Idle,
            queue: TaskQueue::default(),
            awaiting_executor: false,
            baseline: 0,
            last_poll_ms: None,
            scheduled: None,
            solver_applied: None,
            status: String::new(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_emitter(mut self, emitter: EventEmitter) -> Self {
        self.emitter = emitter;
        self
    }

    // === Accessors ===

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn status_text(&self) -> &str {
        &self.status
    }

    /// Read-only view of the queue's tasks
    pub fn tasks(&self) -> &[Task] {
        self.queue.tasks()
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.queue.current()
    }

    pub fn is_complete(&self) -> bool {
        self.state == OrchestratorState::Completed
    }

    pub fn has_failures(&self) -> bool {
        self.queue.has_failures()
    }

    /// Names and reasons of failed tasks
    pub fn failures(&self) -> Vec<(String, String)> {
        self.queue.failures()
    }

    // === Lifecycle ===

    /// Replace the queue with one task per plan step, in the plan's order
    ///
    /// Callers must supply steps in dependency order; the orchestrator does
    /// not reorder. `quantity_buffer` is added uniformly to every target.
    pub fn build_queue(&mut self, steps: &[PlanStep], solver_preference: Option<&str>, quantity_buffer: u32) {
        debug!(label = %self.label, steps = steps.len(), quantity_buffer, "build_queue: called");
        let tasks: Vec<Task> = steps
            .iter()
            .map(|step| {
                let mut task = Task::new(step.item_id, step.name.clone(), step.quantity + quantity_buffer);
                if let Some(solver) = solver_preference {
                    task = task.with_solver(solver);
                }
                task
            })
            .collect();

        self.awaiting_executor = false;
        self.scheduled = None;
        self.last_poll_ms = None;
        self.solver_applied = None;
        self.baseline = 0;

        if tasks.is_empty() {
            self.queue = TaskQueue::default();
            self.state = OrchestratorState::Idle;
            self.set_status("nothing to do");
        } else {
            let count = tasks.len();
            self.queue = TaskQueue::new(tasks);
            self.state = OrchestratorState::Ready;
            self.set_status(&format!("{count} tasks queued"));
        }
    }

    /// Begin working the queue; no-op on an empty queue
    pub fn start(&mut self) {
        debug!(label = %self.label, state = %self.state, "start: called");
        if self.queue.is_empty() {
            debug!(label = %self.label, "start: empty queue, staying idle");
            self.state = OrchestratorState::Idle;
            return;
        }
        self.state = OrchestratorState::Running;
        self.last_poll_ms = None;
        self.scheduled = None;
        info!(label = %self.label, tasks = self.queue.len(), "starting task queue");
        self.dispatch_current();
    }

    /// Halt: advisory stop to the executor, discard any in-flight bookkeeping
    pub fn stop(&mut self) {
        debug!(label = %self.label, state = %self.state, "stop: called");
        if self.state == OrchestratorState::Running {
            self.executor.stop();
        }
        if let Some(item_id) = self.solver_applied.take() {
            self.executor.reset_solver(item_id);
        }
        self.awaiting_executor = false;
        self.scheduled = None;
        self.state = OrchestratorState::Idle;
        self.set_status("stopped");
    }

    /// Must be invoked once per tick; no-op unless running
    ///
    /// Busy-flag polls are rate-limited to `poll_interval_ms` so the external
    /// executor's status query is not hammered. Scheduled actions fire on
    /// their own timers, ahead of the gate.
    pub fn update(&mut self) {
        if self.state != OrchestratorState::Running {
            return;
        }
        let now = self.clock.now_ms();

        if let Some(action) = self.scheduled
            && now >= action.due_ms
        {
            self.scheduled = None;
            debug!(label = %self.label, kind = ?action.kind, "update: scheduled action due");
            match action.kind {
                // Both re-enter the dispatch path: after an advance the
                // cursor already points at the next task, after a retry it
                // still points at the shortfall task.
                ScheduledKind::Redispatch | ScheduledKind::StartNext => self.dispatch_current(),
            }
            return;
        }

        if !self.awaiting_executor {
            return;
        }

        if let Some(last) = self.last_poll_ms
            && now.saturating_sub(last) < self.config.poll_interval_ms
        {
            return;
        }
        self.last_poll_ms = Some(now);

        if self.executor.is_busy() {
            debug!(label = %self.label, "update: executor busy");
            return;
        }
        self.settle_current();
    }

    // === Internals ===

    /// Dispatch the task under the cursor: record the baseline, apply any
    /// solver override, and instruct the executor for the remaining quantity
    fn dispatch_current(&mut self) {
        let Some(task) = self.queue.current() else {
            self.complete_queue();
            return;
        };
        let item_id = task.item_id;
        let name = task.name.clone();
        let remaining = task.remaining();
        let solver = task.solver.clone();

        if remaining == 0 {
            // A satisfied task is never re-dispatched
            debug!(label = %self.label, item_id, "dispatch_current: nothing remaining, skipping");
            if let Some(task) = self.queue.current_mut()
                && !task.status.is_terminal()
            {
                if task.confirmed >= task.target && task.target > 0 {
                    task.mark_completed();
                } else {
                    task.mark_skipped();
                }
            }
            self.advance_after_task();
            return;
        }

        self.baseline = self.inventory.count(item_id);
        debug!(label = %self.label, item_id, remaining, baseline = self.baseline, "dispatch_current: dispatching");

        if let Some(solver) = &solver {
            self.executor.change_solver(item_id, solver, true);
            self.solver_applied = Some(item_id);
        }

        match self.executor.start_job(item_id, remaining) {
            Ok(()) => {
                if let Some(task) = self.queue.current_mut() {
                    task.mark_in_progress();
                }
                self.awaiting_executor = true;
                self.last_poll_ms = Some(self.clock.now_ms());
                self.set_status(&format!("producing {name} x{remaining}"));
                self.emitter.task_started(item_id, &name, remaining);
            }
            Err(e) => {
                let reason = format!("failed to start job for {name}: {e}");
                warn!(label = %self.label, item_id, %reason, "dispatch_current: dispatch failed");
                if let Some(task) = self.queue.current_mut() {
                    task.mark_failed(reason.clone());
                }
                self.emitter.task_failed(item_id, &name, &reason);
                self.advance_after_task();
            }
        }
    }

    /// The executor went idle: read the delta and decide complete/retry/fail
    ///
    /// Assumes no other process shrinks the item's inventory count between
    /// the baseline read and this poll; if one does, the delta floors at zero
    /// and the task takes the retry path, but confirmed progress is never
    /// lost.
    fn settle_current(&mut self) {
        self.awaiting_executor = false;
        let Some(task) = self.queue.current() else {
            self.complete_queue();
            return;
        };
        let item_id = task.item_id;
        let name = task.name.clone();
        let target = task.target;

        let current = self.inventory.count(item_id);
        let delta = current.saturating_sub(self.baseline);
        debug!(label = %self.label, item_id, baseline = self.baseline, current, delta, "settle_current: executor idle");

        let (confirmed, remaining, retries) = {
            let task = self.queue.current_mut().expect("current task checked above");
            task.record_progress(delta);
            (task.confirmed, task.remaining(), task.retries)
        };

        if remaining == 0 {
            info!(label = %self.label, item_id, confirmed, "task completed");
            if let Some(task) = self.queue.current_mut() {
                task.mark_completed();
            }
            self.emitter.task_completed(item_id, &name, confirmed);
            self.advance_after_task();
            return;
        }

        if retries < self.config.retry_cap {
            let attempt = retries + 1;
            if let Some(task) = self.queue.current_mut() {
                task.retries = attempt;
            }
            if delta == 0 {
                // Idle with zero progress, typically missing prerequisites
                warn!(label = %self.label, item_id, attempt, cap = self.config.retry_cap, "executor went idle with no progress, retrying");
                self.set_status(&format!(
                    "{name}: no progress, retry {attempt}/{}",
                    self.config.retry_cap
                ));
            } else {
                info!(label = %self.label, item_id, delta, remaining, attempt, "partial progress, retrying shortfall");
                self.set_status(&format!(
                    "{name}: {confirmed}/{target} done, retrying shortfall ({attempt}/{})",
                    self.config.retry_cap
                ));
            }
            self.schedule(ScheduledKind::Redispatch, self.config.retry_delay_ms);
            return;
        }

        let reason = if confirmed == 0 {
            format!(
                "executor produced 0 items after {} retries (missing prerequisites?)",
                self.config.retry_cap
            )
        } else {
            format!(
                "only {confirmed} of {target} produced after {} retries",
                self.config.retry_cap
            )
        };
        warn!(label = %self.label, item_id, %reason, "task failed");
        if let Some(task) = self.queue.current_mut() {
            task.mark_failed(reason.clone());
        }
        self.emitter.task_failed(item_id, &name, &reason);
        self.advance_after_task();
    }

    /// Restore executor defaults and move the cursor forward
    fn advance_after_task(&mut self) {
        if let Some(item_id) = self.solver_applied.take() {
            debug!(label = %self.label, item_id, "advance_after_task: restoring solver");
            self.executor.reset_solver(item_id);
        }
        self.queue.advance();
        if self.queue.is_terminal() {
            self.complete_queue();
        } else {
            self.set_status("waiting for executor to settle");
            self.schedule(ScheduledKind::StartNext, self.config.settle_delay_ms);
        }
    }

    fn complete_queue(&mut self) {
        let completed = self.queue.completed_count();
        let total = self.queue.len();
        let failed = self.queue.failures().len();
        info!(label = %self.label, completed, failed, total, "queue complete");
        self.state = OrchestratorState::Completed;
        self.awaiting_executor = false;
        self.scheduled = None;
        if failed == 0 {
            self.set_status(&format!("completed {completed}/{total} tasks"));
        } else {
            self.set_status(&format!("completed {completed}/{total} tasks ({failed} failed)"));
        }
    }

    fn schedule(&mut self, kind: ScheduledKind, delay_ms: u64) {
        debug_assert!(self.scheduled.is_none(), "only one scheduled action may be outstanding");
        let due_ms = self.clock.now_ms() + delay_ms;
        debug!(label = %self.label, ?kind, due_ms, "schedule: action queued");
        self.scheduled = Some(ScheduledAction { due_ms, kind });
    }

    fn set_status(&mut self, status: &str) {
        if self.status != status {
            self.status = status.to_string();
            self.emitter.status_changed(status);
        }
    }
}
