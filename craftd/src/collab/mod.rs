//! External collaborator contracts
//!
//! The orchestration core never touches the environment directly. Everything
//! it needs to observe or drive (inventory counts, executor busy flags,
//! navigation, world status) comes through the traits in this module,
//! injected into each component's constructor. Tests and the demo binary
//! substitute the simulated implementations in [`sim`].

pub mod sim;
mod traits;

pub use traits::{ActionIssuer, InventoryReader, JobExecutor, Mover, Resolver, WorldProbe};
