//! Task orchestration
//!
//! A [`TaskOrchestrator`] drives one task queue to completion by delegating
//! each task to an external executor, polling its busy flag, and inferring
//! actual progress from before/after inventory-count deltas. The crafting and
//! gathering orchestrators are two instances of this one type.

mod config;
mod core;

pub use config::OrchestratorConfig;
pub use core::{OrchestratorState, TaskOrchestrator};
