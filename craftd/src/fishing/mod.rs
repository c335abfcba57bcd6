//! Fishing session
//!
//! An autonomous supervised loop with no parent orchestrator: validate
//! prerequisites, navigate to a spot, apply buffs, cast, and account catches
//! by watching the falling edge of the world's "currently fishing" flag,
//! budgeting GP along the way.

mod config;
mod session;
mod spots;

pub use config::{BuffPolicy, CordialPolicy, FishingConfig};
pub use session::{FishingSession, SessionState};
pub use spots::{FishingSpot, default_spots, nearest_spot};
