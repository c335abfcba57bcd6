//! Event vocabulary
//!
//! Each event carries the label of the component that raised it ("workflow",
//! "craft", "gather", "fishing"), so a consumer can subscribe to the bus once
//! and filter down to the channels it cares about.

use serde::{Deserialize, Serialize};

/// Observable activity across the supervision core
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // === Workflow lifecycle ===
    /// The workflow engine changed phase
    WorkflowStateChanged { source: String, from: String, to: String },
    /// A human-readable status line changed
    StatusChanged { source: String, message: String },
    /// The workflow ran to the end (success reflects task failures)
    WorkflowCompleted {
        source: String,
        success: bool,
        failed_tasks: usize,
    },

    // === Orchestrated tasks ===
    /// A task was dispatched to an external executor
    TaskStarted {
        source: String,
        item_id: u32,
        name: String,
        quantity: u32,
    },
    /// A task reached its target quantity
    TaskCompleted {
        source: String,
        item_id: u32,
        name: String,
        confirmed: u32,
    },
    /// A task exhausted its retries
    TaskFailed {
        source: String,
        item_id: u32,
        name: String,
        reason: String,
    },

    // === Fishing session ===
    /// The fishing session changed state
    SessionStateChanged { source: String, from: String, to: String },
    /// A falling edge of the fishing flag was observed
    CatchRecorded { source: String, total: u32 },

    // === Errors & warnings ===
    /// An unrecoverable error; the component has entered its Error state
    Error {
        source: String,
        context: String,
        message: String,
    },
    /// Advisory only
    Warning {
        source: String,
        context: String,
        message: String,
    },
}

impl Event {
    /// Label of the component that raised this event
    pub fn source(&self) -> &str {
        match self {
            Event::WorkflowStateChanged { source, .. }
            | Event::StatusChanged { source, .. }
            | Event::WorkflowCompleted { source, .. }
            | Event::TaskStarted { source, .. }
            | Event::TaskCompleted { source, .. }
            | Event::TaskFailed { source, .. }
            | Event::SessionStateChanged { source, .. }
            | Event::CatchRecorded { source, .. }
            | Event::Error { source, .. }
            | Event::Warning { source, .. } => source,
        }
    }

    /// Event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::WorkflowStateChanged { .. } => "WorkflowStateChanged",
            Event::StatusChanged { .. } => "StatusChanged",
            Event::WorkflowCompleted { .. } => "WorkflowCompleted",
            Event::TaskStarted { .. } => "TaskStarted",
            Event::TaskCompleted { .. } => "TaskCompleted",
            Event::TaskFailed { .. } => "TaskFailed",
            Event::SessionStateChanged { .. } => "SessionStateChanged",
            Event::CatchRecorded { .. } => "CatchRecorded",
            Event::Error { .. } => "Error",
            Event::Warning { .. } => "Warning",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_source() {
        let event = Event::CatchRecorded {
            source: "fishing".to_string(),
            total: 3,
        };
        assert_eq!(event.source(), "fishing");
        assert_eq!(event.event_type(), "CatchRecorded");
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let events = vec![
            Event::WorkflowStateChanged {
                source: "workflow".into(),
                from: "resolving".into(),
                to: "checking_inventory".into(),
            },
            Event::TaskFailed {
                source: "craft".into(),
                item_id: 12,
                name: "oak plank".into(),
                reason: "executor went idle having produced 0 items".into(),
            },
            Event::Error {
                source: "fishing".into(),
                context: "navigation".into(),
                message: "navigation timed out".into(),
            },
        ];

        for event in events {
            let event_type = event.event_type();
            let json = serde_json::to_string(&event).unwrap();
            let parsed: Event = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed.event_type(), event_type);
            assert_eq!(parsed.source(), event.source());
        }
    }
}
