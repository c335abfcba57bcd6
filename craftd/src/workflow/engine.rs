//! WorkflowEngine - top-level phase sequencer
//!
//! Each `update()` handles exactly one phase; transitions happen by setting
//! the next state and letting the following tick pick it up. Any error
//! returned by a phase handler is converted to the `Error` state at the top
//! of the tick rather than propagating, so the driving loop is never starved
//! by a supervision failure.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::collab::{InventoryReader, JobExecutor, Resolver};
use crate::domain::{Plan, Task};
use crate::events::{EventBus, EventEmitter};
use crate::orchestrator::{OrchestratorConfig, TaskOrchestrator};

use super::log::RunLog;

/// Workflow phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Resolving,
    CheckingInventory,
    PreparingGather,
    Gathering,
    PreparingCraft,
    Crafting,
    Completed,
    Error,
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Resolving => write!(f, "resolving"),
            Self::CheckingInventory => write!(f, "checking_inventory"),
            Self::PreparingGather => write!(f, "preparing_gather"),
            Self::Gathering => write!(f, "gathering"),
            Self::PreparingCraft => write!(f, "preparing_craft"),
            Self::Crafting => write!(f, "crafting"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Fatal workflow failures
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("recipe resolution failed: {0}")]
    Resolution(String),

    #[error("missing materials that cannot be gathered or crafted: {0}")]
    MissingMaterials(String),

    #[error("gathering failed for: {0}")]
    GatherFailed(String),
}

/// Behavior switches for a workflow run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Halt on missing pre-supplied materials and on gather failures
    #[serde(default)]
    pub strict_materials: bool,

    /// Extra units added to every craft task's target
    #[serde(default)]
    pub quantity_buffer: u32,

    /// Solver preference applied to craft tasks, if any
    pub craft_solver: Option<String>,
}

struct Request {
    item_id: u32,
    name: String,
    quantity: u32,
}

/// Top-level phase sequencer driving the two task orchestrators
pub struct WorkflowEngine {
    config: WorkflowConfig,
    resolver: Arc<dyn Resolver>,
    inventory: Arc<dyn InventoryReader>,
    crafter_exec: Arc<dyn JobExecutor>,
    gatherer_exec: Arc<dyn JobExecutor>,
    crafter: TaskOrchestrator,
    gatherer: TaskOrchestrator,
    emitter: EventEmitter,

    state: WorkflowState,
    status: String,
    plan: Option<Plan>,
    request: Option<Request>,
    log: RunLog,
}

impl WorkflowEngine {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        inventory: Arc<dyn InventoryReader>,
        crafter_exec: Arc<dyn JobExecutor>,
        gatherer_exec: Arc<dyn JobExecutor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        debug!("WorkflowEngine::new: called");
        let crafter = TaskOrchestrator::new("craft", crafter_exec.clone(), inventory.clone(), clock.clone());
        let gatherer = TaskOrchestrator::new("gather", gatherer_exec.clone(), inventory.clone(), clock);
        Self {
            config: WorkflowConfig::default(),
            resolver,
            inventory,
            crafter_exec,
            gatherer_exec,
            crafter,
            gatherer,
            emitter: EventEmitter::disconnected("workflow"),
            state: WorkflowState::Idle,
            status: String::new(),
            plan: None,
            request: None,
            log: RunLog::new(),
        }
    }

    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_orchestrator_config(mut self, config: OrchestratorConfig) -> Self {
        self.crafter = self.crafter.with_config(config.clone());
        self.gatherer = self.gatherer.with_config(config);
        self
    }

    /// Wire all emitters (workflow, craft, gather) to a bus
    pub fn with_bus(mut self, bus: &EventBus) -> Self {
        self.emitter = bus.emitter_for("workflow");
        self.crafter = self.crafter.with_emitter(bus.emitter_for("craft"));
        self.gatherer = self.gatherer.with_emitter(bus.emitter_for("gather"));
        self
    }

    // === Accessors ===

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn status_text(&self) -> &str {
        &self.status
    }

    pub fn run_log(&self) -> &RunLog {
        &self.log
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn craft_tasks(&self) -> &[Task] {
        self.crafter.tasks()
    }

    pub fn gather_tasks(&self) -> &[Task] {
        self.gatherer.tasks()
    }

    pub fn is_complete(&self) -> bool {
        self.state == WorkflowState::Completed
    }

    pub fn has_failures(&self) -> bool {
        self.crafter.has_failures() || self.gatherer.has_failures()
    }

    // === Lifecycle ===

    /// Begin a new run for `quantity` of the requested item
    pub fn start(&mut self, item_id: u32, name: impl Into<String>, quantity: u32) {
        let name = name.into();
        info!(item_id, %name, quantity, "workflow starting");
        // Each phase recomputes its inputs from current world state, so a
        // re-run only needs the orchestrators quiesced
        self.crafter.stop();
        self.gatherer.stop();
        self.plan = None;
        self.log.clear();
        self.log.append(format!("workflow started: {name} x{quantity}"));
        self.request = Some(Request {
            item_id,
            name,
            quantity,
        });
        self.transition(WorkflowState::Resolving);
    }

    /// Cancel from any state; both orchestrators are stopped defensively
    pub fn cancel(&mut self) {
        if self.state == WorkflowState::Idle {
            return;
        }
        info!(state = %self.state, "workflow cancelled");
        self.crafter.stop();
        self.gatherer.stop();
        self.log.append("workflow cancelled");
        self.transition(WorkflowState::Idle);
    }

    /// Must be invoked once per tick by the external driver
    pub fn update(&mut self) {
        if matches!(
            self.state,
            WorkflowState::Idle | WorkflowState::Completed | WorkflowState::Error
        ) {
            return;
        }
        if let Err(e) = self.tick() {
            self.fail(&format!("{e}"));
        }
    }

    fn tick(&mut self) -> eyre::Result<()> {
        match self.state {
            WorkflowState::Resolving => self.tick_resolving(),
            WorkflowState::CheckingInventory => self.tick_checking_inventory(),
            WorkflowState::PreparingGather => self.tick_preparing_gather(),
            WorkflowState::Gathering => self.tick_gathering(),
            WorkflowState::PreparingCraft => self.tick_preparing_craft(),
            WorkflowState::Crafting => self.tick_crafting(),
            _ => Ok(()),
        }
    }

    // === Phase handlers ===

    fn tick_resolving(&mut self) -> eyre::Result<()> {
        let request = self.request.as_ref().expect("request set by start()");
        let (item_id, name, quantity) = (request.item_id, request.name.clone(), request.quantity);
        debug!(item_id, quantity, "tick_resolving");
        self.set_status(&format!("resolving recipe for {name}"));

        let plan = self
            .resolver
            .resolve(item_id, quantity)
            .map_err(|e| WorkflowError::Resolution(e.to_string()))?;

        self.log.append(format!(
            "plan resolved: {} gatherable, {} craft steps, {} other materials",
            plan.gather_items.len(),
            plan.craft_steps.len(),
            plan.other_materials.len()
        ));
        self.plan = Some(plan);
        self.transition(WorkflowState::CheckingInventory);
        Ok(())
    }

    fn tick_checking_inventory(&mut self) -> eyre::Result<()> {
        debug!("tick_checking_inventory");
        self.set_status("checking inventory");
        let plan = self.plan.as_mut().expect("plan set by resolving phase");
        plan.refresh_owned(self.inventory.as_ref());

        let missing_other = plan.missing_other_materials();
        let gather_steps = plan.gather_shortfalls();

        // Advisory only: gathering may need more distinct slots than are free
        let free = self.inventory.free_slots();
        if gather_steps.len() as u32 > free {
            let warning = format!(
                "gathering {} distinct items with only {free} free inventory slots",
                gather_steps.len()
            );
            warn!(%warning, "inventory space advisory");
            self.log.append(format!("warning: {warning}"));
            self.emitter.warning("inventory", &warning);
        }

        if !missing_other.is_empty() {
            let listed = missing_other.join(", ");
            if self.config.strict_materials {
                return Err(WorkflowError::MissingMaterials(listed).into());
            }
            warn!(%listed, "missing pre-supplied materials, proceeding");
            self.log.append(format!("warning: missing materials: {listed}"));
            self.emitter.warning("materials", &format!("missing materials: {listed}"));
        }

        if gather_steps.is_empty() {
            self.log.append("nothing to gather, moving straight to crafting");
            self.transition(WorkflowState::PreparingCraft);
        } else {
            self.log.append(format!("{} materials to gather", gather_steps.len()));
            self.transition(WorkflowState::PreparingGather);
        }
        Ok(())
    }

    fn tick_preparing_gather(&mut self) -> eyre::Result<()> {
        debug!("tick_preparing_gather");
        self.gatherer_exec.check_availability()?;

        let steps = self.plan.as_ref().expect("plan set").gather_shortfalls();
        self.gatherer.build_queue(&steps, None, 0);
        self.gatherer.start();
        self.log.append(format!("gathering started: {} tasks", steps.len()));
        self.transition(WorkflowState::Gathering);
        Ok(())
    }

    fn tick_gathering(&mut self) -> eyre::Result<()> {
        self.gatherer.update();
        let orch_status = self.gatherer.status_text().to_string();
        self.set_status(&format!("gathering: {orch_status}"));

        if !self.gatherer.is_complete() {
            return Ok(());
        }

        if self.gatherer.has_failures() {
            let failed: Vec<String> = self.gatherer.failures().into_iter().map(|(name, _)| name).collect();
            let listed = failed.join(", ");
            if self.config.strict_materials {
                return Err(WorkflowError::GatherFailed(listed).into());
            }
            warn!(%listed, "gather tasks failed, proceeding");
            self.log.append(format!("warning: gather tasks failed: {listed}"));
        } else {
            self.log.append("gathering complete");
        }

        if let Some(plan) = self.plan.as_mut() {
            plan.refresh_owned(self.inventory.as_ref());
        }
        self.transition(WorkflowState::PreparingCraft);
        Ok(())
    }

    fn tick_preparing_craft(&mut self) -> eyre::Result<()> {
        debug!("tick_preparing_craft");
        self.crafter_exec.check_availability()?;

        let steps = self.plan.as_ref().expect("plan set").craft_steps.clone();
        if steps.is_empty() {
            self.log.append("nothing to craft");
            self.finish();
            return Ok(());
        }
        self.crafter
            .build_queue(&steps, self.config.craft_solver.as_deref(), self.config.quantity_buffer);
        self.crafter.start();
        self.log.append(format!("crafting started: {} tasks", steps.len()));
        self.transition(WorkflowState::Crafting);
        Ok(())
    }

    fn tick_crafting(&mut self) -> eyre::Result<()> {
        self.crafter.update();
        let orch_status = self.crafter.status_text().to_string();
        self.set_status(&format!("crafting: {orch_status}"));

        if !self.crafter.is_complete() {
            return Ok(());
        }

        // Craft failures are reported but do not keep the pipeline from
        // reaching its end; "ran to completion" and "every task succeeded"
        // are distinct outcomes
        for (name, reason) in self.crafter.failures() {
            self.log.append(format!("craft failed: {name}: {reason}"));
        }
        self.finish();
        Ok(())
    }

    // === Internals ===

    fn finish(&mut self) {
        let failed = self.crafter.failures().len() + self.gatherer.failures().len();
        let success = failed == 0;
        info!(success, failed, "workflow complete");
        self.log.append(if success {
            "workflow completed".to_string()
        } else {
            format!("workflow completed with {failed} failed tasks")
        });
        self.emitter.workflow_completed(success, failed);
        self.transition(WorkflowState::Completed);
    }

    fn fail(&mut self, message: &str) {
        debug_assert!(!message.is_empty(), "error reason must be non-empty");
        warn!(%message, "workflow error");
        self.log.append(format!("error: {message}"));
        self.emitter.error(&self.state.to_string(), message);
        self.status = message.to_string();
        self.transition(WorkflowState::Error);
    }

    fn transition(&mut self, to: WorkflowState) {
        if self.state == to {
            return;
        }
        let from = self.state;
        debug!(%from, %to, "workflow transition");
        self.state = to;
        self.log.append(format!("state: {from} -> {to}"));
        self.emitter.workflow_state_changed(&from.to_string(), &to.to_string());
    }

    fn set_status(&mut self, status: &str) {
        if self.status != status {
            self.status = status.to_string();
            self.emitter.status_changed(status);
        }
    }
}
