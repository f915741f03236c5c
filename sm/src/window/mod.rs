//! Window handles and the host bridge
//!
//! A satellite is an independently executing display surface. The main
//! context only ever sees it through a [`WindowHandle`], which may stop being
//! alive at any moment without notice. New surfaces are requested from the
//! [`WindowHost`], which answers asynchronously: the satellite announces
//! itself later through the registration callback.

mod geometry;
pub mod naming;
mod simulated;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SatelliteResult;
use crate::manager::SatelliteMessage;

pub use geometry::{Geometry, Point, Size};
pub use simulated::{SimulatedHost, SimulatedWindow};

/// Identity of a window handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(Uuid);

impl WindowId {
    /// Generate a fresh, time-ordered id
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for WindowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to a satellite's display surface
///
/// Every method is synchronous from the caller's point of view. Liveness is
/// polled: nothing tells the coordinator when a window goes away, so callers
/// check [`WindowHandle::is_alive`] before sending.
pub trait WindowHandle: Send + Sync + fmt::Debug {
    /// Stable identity, used for (name, handle) equality
    fn id(&self) -> WindowId;

    /// Whether the surface still exists
    fn is_alive(&self) -> bool;

    /// Bring the window to the foreground
    fn focus(&self) -> SatelliteResult<()>;

    /// Close the window
    fn close(&self) -> SatelliteResult<()>;

    /// Current client-area size and screen position
    fn geometry(&self) -> SatelliteResult<Geometry>;

    /// Invoke the named satellite operation carried by `message`
    fn deliver(&self, message: SatelliteMessage) -> SatelliteResult<()>;
}

/// Shared window handle
pub type SharedWindow = Arc<dyn WindowHandle>;

/// A request to create a new display surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRequest {
    /// Logical satellite name
    pub name: String,
    /// Host-level window name
    #[serde(rename = "window-name")]
    pub window_name: String,
    pub size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
}

/// Creation and activation side of the inter-context bridge
pub trait WindowHost: Send + Sync {
    /// Ask the environment to create a window
    ///
    /// Returning `Ok` only means the request was issued. Hosts that block the
    /// window silently still return `Ok`.
    fn open_window(&self, request: OpenRequest) -> SatelliteResult<()>;

    /// Ask a native host shell to bring a window to the front by host name
    fn activate_by_name(&self, window_name: &str) -> SatelliteResult<()>;

    /// Usable screen area for new windows
    fn screen_bounds(&self) -> Size;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_ids_are_unique() {
        let a = WindowId::new();
        let b = WindowId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_open_request_serialization() {
        let request = OpenRequest {
            name: "plots".to_string(),
            window_name: naming::window_name("plots"),
            size: Size::new(800, 600),
            position: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("window-name"));
        assert!(!json.contains("position"));
    }
}
