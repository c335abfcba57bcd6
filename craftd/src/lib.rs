//! craftd - supervised orchestration over coarse executors
//!
//! craftd turns "craft N of item X" into a supervised pipeline: resolve the
//! recipe into a plan, gather what is short, then craft, delegating the
//! actual work to external executors that only expose a busy flag. Progress
//! is never taken on faith; it is inferred from inventory-count deltas taken
//! before and after each dispatch. A separate fishing session supervises a
//! cast/catch loop the same way, from world-state probes alone.
//!
//! # Core Concepts
//!
//! - **Delegate, then verify**: executors are black boxes; inventory deltas
//!   are the only ground truth for completion
//! - **Cooperative ticks**: every component advances via a cheap, rate-limited
//!   `update()` call driven by one outer loop
//! - **Injected collaborators**: resolvers, executors, movers, and world
//!   probes are trait objects, so the whole pipeline runs against simulators
//!   in tests and in the demo binary
//!
//! # Modules
//!
//! - [`domain`] - tasks, queues, plans, geometry
//! - [`collab`] - collaborator traits and simulated implementations
//! - [`orchestrator`] - single-queue task supervision with retry and delta inference
//! - [`workflow`] - the gather-then-craft phase sequencer
//! - [`fishing`] - the autonomous fishing session
//! - [`events`] - broadcast bus for live observability
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod clock;
pub mod collab;
pub mod config;
pub mod domain;
pub mod events;
pub mod fishing;
pub mod orchestrator;
pub mod workflow;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use collab::{ActionIssuer, InventoryReader, JobExecutor, Mover, Resolver, WorldProbe};
pub use config::Config;
pub use domain::{MaterialNeed, Plan, PlanStep, Task, TaskQueue, TaskStatus, Vec3};
pub use events::{Event, EventBus, EventEmitter, create_event_bus};
pub use fishing::{FishingConfig, FishingSession, FishingSpot, SessionState};
pub use orchestrator::{OrchestratorConfig, OrchestratorState, TaskOrchestrator};
pub use workflow::{RunLog, WorkflowConfig, WorkflowEngine, WorkflowState};
