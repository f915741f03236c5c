//! Message types for satellite coordination

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::SatelliteResult;
use crate::window::Size;

use super::callbacks::CallbackArgs;

/// An application event forwarded to satellites
///
/// The payload is opaque to the coordinator; only the event type is used for
/// logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEvent {
    #[serde(rename = "event-type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

impl ClientEvent {
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }
}

/// An application command broadcast to active satellites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: String,
}

impl Command {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Messages the coordinator sends to a satellite window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum SatelliteMessage {
    /// Shared session state, pushed once on registration
    SetSessionSnapshot { snapshot: Value },

    /// Last known startup parameters for this satellite name
    SetStartupParams { params: Value },

    /// The window was brought back to the front with new parameters
    NotifyReactivated {
        #[serde(default)]
        params: Option<Value>,
    },

    /// The window is about to be closed and reopened
    NotifyPendingReactivate,

    /// A broadcast application event
    DispatchEvent { event: ClientEvent },

    /// A broadcast application command
    DispatchCommand {
        #[serde(rename = "command-id")]
        command_id: String,
    },
}

impl SatelliteMessage {
    /// Operation name invoked on the satellite side
    pub fn op_name(&self) -> &'static str {
        match self {
            SatelliteMessage::SetSessionSnapshot { .. } => "set-session-snapshot",
            SatelliteMessage::SetStartupParams { .. } => "set-startup-params",
            SatelliteMessage::NotifyReactivated { .. } => "notify-reactivated",
            SatelliteMessage::NotifyPendingReactivate => "notify-pending-reactivate",
            SatelliteMessage::DispatchEvent { .. } => "dispatch-event",
            SatelliteMessage::DispatchCommand { .. } => "dispatch-command",
        }
    }
}

/// Result of an open request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// An existing window was brought forward in place
    Reactivated,

    /// A window-creation request was issued; `generation` identifies it
    Opened { generation: u64 },
}

/// Requests processed by the Coordinator task
#[derive(Debug)]
pub enum SatelliteRequest {
    /// Open or reactivate a satellite
    Open {
        name: String,
        params: Option<Value>,
        preferred_size: Size,
        reply: oneshot::Sender<SatelliteResult<OpenOutcome>>,
    },

    /// Destroy and recreate a live satellite in place
    ForceReopen {
        name: String,
        params: Option<Value>,
        reply: oneshot::Sender<SatelliteResult<()>>,
    },

    /// Bring a live satellite to the front
    Activate {
        name: String,
        reply: oneshot::Sender<()>,
    },

    /// Close one satellite
    Close {
        name: String,
        reply: oneshot::Sender<()>,
    },

    /// Close every satellite and discard pending events
    CloseAll { reply: oneshot::Sender<()> },

    /// Broadcast an event
    DispatchEvent {
        event: ClientEvent,
        reply: oneshot::Sender<()>,
    },

    /// Broadcast a command
    DispatchCommand {
        command: Command,
        reply: oneshot::Sender<()>,
    },

    /// Check for a live window under a name
    WindowExists {
        name: String,
        reply: oneshot::Sender<bool>,
    },

    /// Satellite-originated call through the callback table
    Invoke {
        op: String,
        args: CallbackArgs,
        reply: oneshot::Sender<SatelliteResult<()>>,
    },

    /// Replace the session snapshot pushed to registering satellites
    UpdateSession {
        snapshot: Value,
        reply: oneshot::Sender<()>,
    },

    /// The main window is closing
    MainWindowClosed { reply: oneshot::Sender<()> },

    /// Open timer expiry (internal)
    OpenTimeout { name: String, generation: u64 },

    /// Get current metrics
    GetMetrics { reply: oneshot::Sender<ManagerMetrics> },

    /// Shutdown the coordinator
    Shutdown,
}

/// Coordinator metrics for observability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManagerMetrics {
    pub active_satellites: usize,
    pub buffering_satellites: usize,
    pub opens_requested: u64,
    pub reactivations: u64,
    pub events_dispatched: u64,
    pub events_buffered: u64,
    pub commands_dispatched: u64,
    pub commands_dropped: u64,
    pub deliveries_failed: u64,
    pub dead_handles_evicted: u64,
    pub open_timeouts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_satellite_message_serialization() {
        let msg = SatelliteMessage::DispatchEvent {
            event: ClientEvent::new("console_output", json!({"text": "> 1 + 1"})),
        };

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""op":"dispatch-event""#));
        assert!(json.contains("event-type"));

        let parsed: SatelliteMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_dispatch_command_field_name() {
        let msg = SatelliteMessage::DispatchCommand {
            command_id: "zoomIn".to_string(),
        };

        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"op":"dispatch-command","command-id":"zoomIn"}"#);
    }

    #[test]
    fn test_op_name_matches_serde_tag() {
        let msg = SatelliteMessage::NotifyPendingReactivate;
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["op"], msg.op_name());
    }
}
