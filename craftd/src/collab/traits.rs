//! Collaborator traits
//!
//! These model cross-process capability calls, so every method is a cheap,
//! non-blocking probe or a fire-and-forget instruction. None of them reports
//! how much work actually happened; the orchestrators infer that from
//! inventory deltas.

use eyre::Result;

use crate::domain::{Plan, Vec3};

/// Recipe resolver: turns an item request into an ordered plan
///
/// Fails with a descriptive error on unknown or unresolvable recipes; any
/// failure here is fatal to the workflow run.
pub trait Resolver: Send + Sync {
    fn resolve(&self, item_id: u32, quantity: u32) -> Result<Plan>;
}

/// Read-only inventory access
///
/// The core must never depend on how these counts are obtained.
pub trait InventoryReader: Send + Sync {
    fn count(&self, item_id: u32) -> u32;
    fn free_slots(&self) -> u32;
}

/// An external executor that produces items (crafting and gathering share
/// this shape)
///
/// The busy flag is the only completion signal the executor gives; a return
/// from `start_job` means the instruction was accepted, not that anything
/// will be produced.
pub trait JobExecutor: Send + Sync {
    /// Tool name, used in availability errors and logs
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    /// Fail fast with the tool's name if the executor is not reachable
    fn check_availability(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            eyre::bail!("{} is not available", self.name())
        }
    }

    fn is_busy(&self) -> bool;

    /// Instruct the executor to begin producing `quantity` units
    fn start_job(&self, item_id: u32, quantity: u32) -> Result<()>;

    /// Advisory halt; the executor may take another poll to go idle
    fn stop(&self);

    /// Temporarily switch the executor's internal policy for one item
    fn change_solver(&self, item_id: u32, solver: &str, temporary: bool);

    /// Restore the default policy for one item
    fn reset_solver(&self, item_id: u32);
}

/// Navigation mover
pub trait Mover: Send + Sync {
    fn is_available(&self) -> bool;
    fn move_to(&self, target: Vec3) -> Result<()>;
    fn is_path_running(&self) -> bool;
    fn is_pathfind_in_progress(&self) -> bool;
    fn stop(&self);
}

/// World-state probes consumed by the fishing session
pub trait WorldProbe: Send + Sync {
    fn position(&self) -> Vec3;
    fn gp(&self) -> u32;
    fn has_status(&self, status_id: u32) -> bool;
    fn is_mounted(&self) -> bool;
    /// The binary "currently performing the activity" flag
    fn is_fishing(&self) -> bool;
    /// Role/job eligibility
    fn can_fish(&self) -> bool;
}

/// Issues a single game action by id
pub trait ActionIssuer: Send + Sync {
    fn use_action(&self, action_id: u32) -> Result<()>;
}
