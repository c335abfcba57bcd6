//! Fishing session policies and timings

use serde::{Deserialize, Serialize};

/// A GP-costed buff the session keeps applied while fishing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuffPolicy {
    #[serde(default)]
    pub enabled: bool,
    pub name: String,
    pub action_id: u32,
    pub status_id: u32,
    pub gp_cost: u32,
}

impl BuffPolicy {
    pub fn disabled(name: &str) -> Self {
        Self {
            enabled: false,
            name: name.to_string(),
            action_id: 0,
            status_id: 0,
            gp_cost: 0,
        }
    }
}

/// The GP-restoring consumable used while waiting for GP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CordialPolicy {
    #[serde(default)]
    pub enabled: bool,
    pub action_id: u32,
    pub gp_restored: u32,
    #[serde(default = "default_cordial_cooldown_ms")]
    pub cooldown_ms: u64,
}

fn default_cordial_cooldown_ms() -> u64 {
    90_000
}

/// Full fishing session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FishingConfig {
    /// Radius searched for a valid spot
    #[serde(default = "default_spot_radius")]
    pub spot_radius: f32,

    /// Distance at which the session counts as arrived
    #[serde(default = "default_arrival_distance")]
    pub arrival_distance: f32,

    /// Hard timeout for navigation
    #[serde(default = "default_nav_timeout_ms")]
    pub nav_timeout_ms: u64,

    /// Minimum gap between issued actions
    #[serde(default = "default_action_cooldown_ms")]
    pub action_cooldown_ms: u64,

    /// Rate limit for all ticks except navigation
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Continuous inactivity after which the cast is assumed lost
    #[serde(default = "default_stall_threshold_ms")]
    pub stall_threshold_ms: u64,

    /// Interval for re-evaluating buffs and GP while idle between casts
    #[serde(default = "default_buff_recheck_ms")]
    pub buff_recheck_ms: u64,

    /// Long-duration quality buff
    #[serde(default = "default_quality_buff")]
    pub quality_buff: BuffPolicy,

    /// Secondary buff
    #[serde(default = "default_secondary_buff")]
    pub secondary_buff: BuffPolicy,

    #[serde(default = "default_cordial")]
    pub cordial: CordialPolicy,

    /// Park in WaitingForGp when GP cannot cover re-applying enabled buffs
    #[serde(default = "default_true")]
    pub gp_floor_enabled: bool,

    #[serde(default = "default_dismount_action")]
    pub dismount_action_id: u32,

    #[serde(default = "default_cast_action")]
    pub cast_action_id: u32,
}

fn default_spot_radius() -> f32 {
    150.0
}

fn default_arrival_distance() -> f32 {
    5.0
}

fn default_nav_timeout_ms() -> u64 {
    60_000
}

fn default_action_cooldown_ms() -> u64 {
    1_500
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_stall_threshold_ms() -> u64 {
    10_000
}

fn default_buff_recheck_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

fn default_dismount_action() -> u32 {
    23
}

fn default_cast_action() -> u32 {
    289
}

fn default_quality_buff() -> BuffPolicy {
    BuffPolicy {
        enabled: true,
        name: "patience".to_string(),
        action_id: 4102,
        status_id: 761,
        gp_cost: 560,
    }
}

fn default_secondary_buff() -> BuffPolicy {
    BuffPolicy {
        enabled: false,
        name: "chum".to_string(),
        action_id: 4104,
        status_id: 763,
        gp_cost: 100,
    }
}

fn default_cordial() -> CordialPolicy {
    CordialPolicy {
        enabled: true,
        action_id: 20_701,
        gp_restored: 300,
        cooldown_ms: default_cordial_cooldown_ms(),
    }
}

impl Default for FishingConfig {
    fn default() -> Self {
        Self {
            spot_radius: default_spot_radius(),
            arrival_distance: default_arrival_distance(),
            nav_timeout_ms: default_nav_timeout_ms(),
            action_cooldown_ms: default_action_cooldown_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            stall_threshold_ms: default_stall_threshold_ms(),
            buff_recheck_ms: default_buff_recheck_ms(),
            quality_buff: default_quality_buff(),
            secondary_buff: default_secondary_buff(),
            cordial: default_cordial(),
            gp_floor_enabled: default_true(),
            dismount_action_id: default_dismount_action(),
            cast_action_id: default_cast_action(),
        }
    }
}
