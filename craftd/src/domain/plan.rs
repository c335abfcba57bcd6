//! Resolved workflow plan
//!
//! Produced once per run by the external resolver: an ordered craft sequence,
//! the materials obtainable from the world, and the materials that are
//! neither craftable nor gatherable and must already be on hand. Read-only to
//! the core except for the owned-quantity refresh.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collab::InventoryReader;

/// One ordered craft step
///
/// Callers supply steps in dependency order: prerequisite items always
/// precede the items that consume them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub item_id: u32,
    pub name: String,
    pub quantity: u32,
}

/// A material requirement with current holdings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialNeed {
    pub item_id: u32,
    pub name: String,
    pub required: u32,
    pub owned: u32,
}

impl MaterialNeed {
    pub fn new(item_id: u32, name: impl Into<String>, required: u32) -> Self {
        Self {
            item_id,
            name: name.into(),
            required,
            owned: 0,
        }
    }

    /// Units still missing (floor 0)
    pub fn shortfall(&self) -> u32 {
        self.required.saturating_sub(self.owned)
    }
}

/// Resolver output consumed by the workflow engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    /// Ordered craft steps, prerequisites first
    pub craft_steps: Vec<PlanStep>,

    /// Materials obtainable from the world
    pub gather_items: Vec<MaterialNeed>,

    /// Materials that are neither craftable nor gatherable
    pub other_materials: Vec<MaterialNeed>,
}

impl Plan {
    /// Refresh owned quantities for every material from live inventory
    pub fn refresh_owned(&mut self, inventory: &dyn InventoryReader) {
        debug!(
            gather = self.gather_items.len(),
            other = self.other_materials.len(),
            "Plan::refresh_owned: called"
        );
        for need in self.gather_items.iter_mut().chain(self.other_materials.iter_mut()) {
            need.owned = inventory.count(need.item_id);
        }
    }

    /// Gatherable materials still short, as orchestrator steps
    pub fn gather_shortfalls(&self) -> Vec<PlanStep> {
        self.gather_items
            .iter()
            .filter(|n| n.shortfall() > 0)
            .map(|n| PlanStep {
                item_id: n.item_id,
                name: n.name.clone(),
                quantity: n.shortfall(),
            })
            .collect()
    }

    /// Names of non-obtainable materials still short
    pub fn missing_other_materials(&self) -> Vec<String> {
        self.other_materials
            .iter()
            .filter(|n| n.shortfall() > 0)
            .map(|n| format!("{} ({} short)", n.name, n.shortfall()))
            .collect()
    }
}
