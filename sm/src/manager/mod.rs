//! Satellite window coordination
//!
//! The main window opens satellites, buffers events for them while they
//! load, and fans events and commands out to every registered satellite:
//! - **Open:** request a window, reactivating an existing one when the
//!   platform allows it
//! - **Register:** a loaded satellite announces itself and receives the
//!   session snapshot and its startup parameters
//! - **Dispatch:** broadcast events (buffered) and commands (not buffered)
//! - **Teardown:** satellites close when the main window does

mod callbacks;
mod config;
mod coordinator;
mod core;
mod handle;
mod lifecycle;
mod messages;
mod params;
mod pending;
mod platform;
mod registry;

pub use callbacks::{
    CallbackArgs, CallbackTable, FLUSH_PENDING_EVENTS, REGISTER_AS_SATELLITE, REGISTER_CHILD_WINDOW,
    SatelliteCallback, UNREGISTER_CHILD_WINDOW,
};
pub use config::ManagerConfig;
pub use coordinator::Coordinator;
pub use core::{SatelliteManager, WindowContext};
pub use handle::CoordinatorHandle;
pub use lifecycle::MainWindowLifecycle;
pub use messages::{ClientEvent, Command, ManagerMetrics, OpenOutcome, SatelliteMessage, SatelliteRequest};
pub use params::ParameterStore;
pub use pending::PendingEventBuffer;
pub use platform::{BrowserEngine, Platform, ReactivationPolicy};
pub use registry::{ActiveSatellite, SatelliteRegistry};
