//! Domain types for craftd
//!
//! Pure data: tasks and their lifecycle, the ordered task queue, the resolved
//! plan a workflow run consumes, and the small geometry helper the fishing
//! session navigates with. All mutation goes through the owning orchestrator
//! or engine; consumers only ever see read-only views.

mod geo;
mod plan;
mod queue;
mod task;

pub use geo::Vec3;
pub use plan::{MaterialNeed, Plan, PlanStep};
pub use queue::TaskQueue;
pub use task::{Task, TaskStatus};
