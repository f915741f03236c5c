//! Callback table for satellite-originated calls
//!
//! Satellites never hold a reference to the coordinator. They call into the
//! main context by operation name, and the table maps each name to the
//! coordinator function that serves it.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::{SatelliteError, SatelliteResult};
use crate::window::SharedWindow;

use super::core::SatelliteManager;

/// Satellite announces it is ready to receive messages
pub const REGISTER_AS_SATELLITE: &str = "register-as-satellite";

/// Satellite applied its startup params and wants buffered events
pub const FLUSH_PENDING_EVENTS: &str = "flush-pending-events";

/// A non-satellite child window announces itself
pub const REGISTER_CHILD_WINDOW: &str = "register-child-window";

/// A child window is going away
pub const UNREGISTER_CHILD_WINDOW: &str = "unregister-child-window";

/// Arguments for a satellite-originated call
#[derive(Debug, Clone)]
pub struct CallbackArgs {
    pub name: String,
    pub window: Option<SharedWindow>,
}

impl CallbackArgs {
    /// Arguments carrying only a name
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            window: None,
        }
    }

    /// Arguments carrying a name and the caller's own window
    pub fn with_window(name: impl Into<String>, window: SharedWindow) -> Self {
        Self {
            name: name.into(),
            window: Some(window),
        }
    }

    pub(crate) fn require_window(&self, op: &str) -> SatelliteResult<SharedWindow> {
        self.window
            .clone()
            .ok_or_else(|| SatelliteError::MissingHandle { op: op.to_string() })
    }
}

/// Coordinator function reachable from a satellite
pub type SatelliteCallback = fn(&mut SatelliteManager, CallbackArgs) -> SatelliteResult<()>;

#[derive(Default)]
pub struct CallbackTable {
    entries: HashMap<&'static str, SatelliteCallback>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a callback; an operation is only ever installed once
    pub fn install(&mut self, op: &'static str, callback: SatelliteCallback) -> bool {
        if self.entries.contains_key(op) {
            debug!(%op, "CallbackTable::install: already installed");
            return false;
        }
        debug!(%op, "CallbackTable::install: installed");
        self.entries.insert(op, callback);
        true
    }

    pub fn get(&self, op: &str) -> Option<SatelliteCallback> {
        self.entries.get(op).copied()
    }

    pub fn ops(&self) -> Vec<&'static str> {
        let mut ops: Vec<&'static str> = self.entries.keys().copied().collect();
        ops.sort_unstable();
        ops
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackTable").field("ops", &self.ops()).finish()
    }
}
