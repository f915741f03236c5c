//! Satellite window coordination
//!
//! A main window opens satellite windows (plots, viewers, help) and keeps
//! them fed with the same server events it receives. Satellites load
//! asynchronously, so events that arrive before a satellite registers are
//! buffered and replayed in order once it asks for them.
//!
//! # Architecture
//!
//! ```text
//! UI / server event pump ──► CoordinatorHandle ──► Coordinator task
//!                                   ▲                    │
//!       satellite callbacks ────────┘             SatelliteManager
//!                                                 ├── registry
//!                                                 ├── pending buffer
//!                                                 ├── parameter store
//!                                                 └── WindowHost ──► windows
//! ```
//!
//! # Example
//!
//! ```ignore
//! use satellite::manager::{Coordinator, ManagerConfig, Platform};
//! use satellite::window::{SimulatedHost, Size};
//!
//! let host = Arc::new(SimulatedHost::new(Size::new(1920, 1080)));
//! let (handle, _task) = Coordinator::new(ManagerConfig::default(), host.clone(), Platform::default()).spawn();
//! handle.open_satellite("plots", None, Size::new(800, 600)).await?;
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod scenario;
pub mod window;

pub use config::Config;
pub use error::{SatelliteError, SatelliteResult};
pub use manager::{Coordinator, CoordinatorHandle, SatelliteManager};
