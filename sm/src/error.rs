//! Satellite error types

use thiserror::Error;

/// Errors raised by satellite coordination
#[derive(Debug, Error)]
pub enum SatelliteError {
    /// Programmer error: only the main window may open satellites
    #[error("Satellite windows can't launch other satellites (requested: {name})")]
    NotMainWindow { name: String },

    #[error("Delivery of {message} to satellite {name} failed: {reason}")]
    Delivery {
        name: String,
        message: &'static str,
        reason: String,
    },

    #[error("Window {window} is closed")]
    WindowClosed { window: String },

    #[error("Unknown satellite operation: {op}")]
    UnknownOperation { op: String },

    #[error("Operation {op} requires a window handle")]
    MissingHandle { op: String },

    #[error("Coordinator channel closed")]
    ChannelError,
}

/// Result alias for satellite operations
pub type SatelliteResult<T> = Result<T, SatelliteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_main_window_message() {
        let err = SatelliteError::NotMainWindow {
            name: "plots".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("can't launch other satellites"));
        assert!(msg.contains("plots"));
    }

    #[test]
    fn test_delivery_message() {
        let err = SatelliteError::Delivery {
            name: "viewer".to_string(),
            message: "dispatch-event",
            reason: "window closed".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("dispatch-event"));
        assert!(msg.contains("viewer"));
        assert!(msg.contains("window closed"));
    }
}
