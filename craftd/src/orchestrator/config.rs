//! Orchestrator tuning knobs

use serde::{Deserialize, Serialize};

/// Timing and retry configuration for a [`super::TaskOrchestrator`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Minimum interval between executor status polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Re-dispatches allowed per task before it is marked failed
    #[serde(default = "default_retry_cap")]
    pub retry_cap: u32,

    /// Delay before a re-dispatch after zero or partial progress
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Pause between tasks so the executor can fully quiesce
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_retry_cap() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    3_000
}

fn default_settle_delay_ms() -> u64 {
    2_000
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            retry_cap: default_retry_cap(),
            retry_delay_ms: default_retry_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}
