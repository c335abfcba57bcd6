//! Event bus - pub/sub for supervision events
//!
//! Built on tokio broadcast channels. Components emit through a cheap-clone
//! [`EventEmitter`] bound to their source label; consumers subscribe to the
//! bus and filter.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::Event;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4_096;

/// Central event bus
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// Fire-and-forget: no subscribers is fine, the event is dropped.
    pub fn emit(&self, event: Event) {
        debug!(event_type = event.event_type(), source = event.source(), "EventBus::emit");
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Create an emitter bound to a source label
    pub fn emitter_for(&self, source: impl Into<String>) -> EventEmitter {
        let source = source.into();
        debug!(%source, "EventBus::emitter_for: creating emitter");
        EventEmitter {
            tx: self.tx.clone(),
            source,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Handle for a component to emit events without owning the bus
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<Event>,
    source: String,
}

impl EventEmitter {
    /// A detached emitter with no listeners, for components built without a bus
    pub fn disconnected(source: impl Into<String>) -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn emit(&self, event: Event) {
        debug!(event_type = event.event_type(), "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    // === Convenience methods ===

    pub fn workflow_state_changed(&self, from: &str, to: &str) {
        self.emit(Event::WorkflowStateChanged {
            source: self.source.clone(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    pub fn status_changed(&self, message: &str) {
        self.emit(Event::StatusChanged {
            source: self.source.clone(),
            message: message.to_string(),
        });
    }

    pub fn workflow_completed(&self, success: bool, failed_tasks: usize) {
        self.emit(Event::WorkflowCompleted {
            source: self.source.clone(),
            success,
            failed_tasks,
        });
    }

    pub fn task_started(&self, item_id: u32, name: &str, quantity: u32) {
        self.emit(Event::TaskStarted {
            source: self.source.clone(),
            item_id,
            name: name.to_string(),
            quantity,
        });
    }

    pub fn task_completed(&self, item_id: u32, name: &str, confirmed: u32) {
        self.emit(Event::TaskCompleted {
            source: self.source.clone(),
            item_id,
            name: name.to_string(),
            confirmed,
        });
    }

    pub fn task_failed(&self, item_id: u32, name: &str, reason: &str) {
        self.emit(Event::TaskFailed {
            source: self.source.clone(),
            item_id,
            name: name.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn session_state_changed(&self, from: &str, to: &str) {
        self.emit(Event::SessionStateChanged {
            source: self.source.clone(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    pub fn catch_recorded(&self, total: u32) {
        self.emit(Event::CatchRecorded {
            source: self.source.clone(),
            total,
        });
    }

    pub fn error(&self, context: &str, message: &str) {
        self.emit(Event::Error {
            source: self.source.clone(),
            context: context.to_string(),
            message: message.to_string(),
        });
    }

    pub fn warning(&self, context: &str, message: &str) {
        self.emit(Event::Warning {
            source: self.source.clone(),
            context: context.to_string(),
            message: message.to_string(),
        });
    }
}

/// Create an event bus wrapped in an Arc for shared ownership
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_default_capacity())
}
