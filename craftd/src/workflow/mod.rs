//! Workflow engine
//!
//! The top-level phase sequencer: resolve intent into a plan, check holdings
//! against it, then drive the gathering and crafting orchestrators in
//! sequence, aggregating status and surfacing terminal failure.

mod engine;
mod log;

pub use engine::{WorkflowConfig, WorkflowEngine, WorkflowError, WorkflowState};
pub use log::{LogEntry, RunLog};
