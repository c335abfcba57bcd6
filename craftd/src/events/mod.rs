//! Event bus for live observability
//!
//! Every significant transition in the workflow engine, the orchestrators,
//! and the fishing session emits an event. Consumers (the CLI driver, a
//! future UI, log sinks) subscribe to the bus and filter on the event type
//! and source label, so each notification channel can be consumed
//! selectively.

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter, create_event_bus};
pub use types::Event;
