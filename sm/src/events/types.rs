//! Event types for satellite activity
//!
//! These events describe what the coordinator did, not application traffic:
//! - Satellite lifecycle (open, reactivate, register, flush, close)
//! - Failures that were swallowed (delivery, open timeout)
//! - Desktop child windows that are not satellites

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coordinator activity, broadcast to diagnostic subscribers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ManagerEvent {
    // === Satellite Lifecycle ===
    /// A window-creation request was issued
    SatelliteOpening { name: String, width: u32, height: u32 },
    /// A live window was brought forward instead of reopened
    SatelliteReactivated { name: String },
    /// A satellite completed its registration handshake
    SatelliteRegistered { name: String, window_id: String },
    /// Buffered events were replayed to a satellite
    PendingEventsFlushed { name: String, count: usize },
    /// A satellite window was closed on request
    SatelliteClosed { name: String },
    /// Every satellite was torn down
    AllSatellitesClosed { count: usize },
    /// A registry entry was dropped because its window had died
    DeadWindowEvicted { name: String },

    // === Failures ===
    /// A message could not be delivered to a satellite
    DeliveryFailed {
        name: String,
        message: String,
        error: String,
    },
    /// A satellite never registered after being opened
    OpenTimedOut { name: String, discarded_events: usize },

    // === Child Windows ===
    /// A non-satellite child window announced itself
    ChildWindowOpened { name: String, window_id: String },
    /// A child window went away
    ChildWindowClosed { name: String },
}

impl ManagerEvent {
    /// Satellite or child window name this event is about
    pub fn name(&self) -> &str {
        match self {
            ManagerEvent::SatelliteOpening { name, .. }
            | ManagerEvent::SatelliteReactivated { name }
            | ManagerEvent::SatelliteRegistered { name, .. }
            | ManagerEvent::PendingEventsFlushed { name, .. }
            | ManagerEvent::SatelliteClosed { name }
            | ManagerEvent::DeadWindowEvicted { name }
            | ManagerEvent::DeliveryFailed { name, .. }
            | ManagerEvent::OpenTimedOut { name, .. }
            | ManagerEvent::ChildWindowOpened { name, .. }
            | ManagerEvent::ChildWindowClosed { name } => name,
            ManagerEvent::AllSatellitesClosed { .. } => "*",
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            ManagerEvent::SatelliteOpening { .. } => "SatelliteOpening",
            ManagerEvent::SatelliteReactivated { .. } => "SatelliteReactivated",
            ManagerEvent::SatelliteRegistered { .. } => "SatelliteRegistered",
            ManagerEvent::PendingEventsFlushed { .. } => "PendingEventsFlushed",
            ManagerEvent::SatelliteClosed { .. } => "SatelliteClosed",
            ManagerEvent::AllSatellitesClosed { .. } => "AllSatellitesClosed",
            ManagerEvent::DeadWindowEvicted { .. } => "DeadWindowEvicted",
            ManagerEvent::DeliveryFailed { .. } => "DeliveryFailed",
            ManagerEvent::OpenTimedOut { .. } => "OpenTimedOut",
            ManagerEvent::ChildWindowOpened { .. } => "ChildWindowOpened",
            ManagerEvent::ChildWindowClosed { .. } => "ChildWindowClosed",
        }
    }
}

/// A timestamped event for reports
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventLogEntry {
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    pub event: ManagerEvent,
}

impl EventLogEntry {
    /// Create a new log entry with current timestamp
    pub fn new(event: ManagerEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name() {
        let event = ManagerEvent::PendingEventsFlushed {
            name: "plots".to_string(),
            count: 3,
        };
        assert_eq!(event.name(), "plots");
        assert_eq!(event.event_type(), "PendingEventsFlushed");
    }

    #[test]
    fn test_event_serialization() {
        let event = ManagerEvent::DeliveryFailed {
            name: "viewer".to_string(),
            message: "dispatch-event".to_string(),
            error: "window closed".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"DeliveryFailed""#));

        let parsed: ManagerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_event_log_entry() {
        let entry = EventLogEntry::new(ManagerEvent::AllSatellitesClosed { count: 2 });

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("ts"));
        assert!(json.contains("AllSatellitesClosed"));
    }
}
