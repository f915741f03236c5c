//! Coordinator activity events
//!
//! Every swallowed failure and every satellite lifecycle transition is
//! emitted on a tokio broadcast channel. The CLI report, tests and any UI
//! diagnostics panel subscribe to it.

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, create_event_bus};
pub use types::{EventLogEntry, ManagerEvent};
