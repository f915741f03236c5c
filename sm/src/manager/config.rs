//! Coordinator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Channel buffer size for coordinator requests
    #[serde(rename = "channel-buffer")]
    pub channel_buffer: usize,

    /// Capacity of the activity event bus
    #[serde(rename = "event-bus-capacity")]
    pub event_bus_capacity: usize,

    /// Give up on a satellite that has not registered after this many
    /// seconds. Unset keeps waiting forever.
    #[serde(rename = "open-timeout-secs", skip_serializing_if = "Option::is_none")]
    pub open_timeout_secs: Option<u64>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        debug!("ManagerConfig::default: called");
        Self {
            channel_buffer: 256,
            event_bus_capacity: crate::events::DEFAULT_CHANNEL_CAPACITY,
            open_timeout_secs: None,
        }
    }
}

impl ManagerConfig {
    /// Get the open timeout as a Duration
    pub fn open_timeout(&self) -> Option<Duration> {
        debug!(open_timeout_secs = ?self.open_timeout_secs, "ManagerConfig::open_timeout: called");
        self.open_timeout_secs.filter(|secs| *secs > 0).map(Duration::from_secs)
    }
}
