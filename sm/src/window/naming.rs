//! Host-level window names for satellites
//!
//! The host shell knows satellites by a window name derived from the logical
//! satellite name. Child windows that are not satellites keep their own names.

/// Marker prepended to a satellite name to form its host window name
pub const SATELLITE_WINDOW_PREFIX: &str = "_satellite_";

/// Host window name for a logical satellite name
pub fn window_name(name: &str) -> String {
    format!("{}{}", SATELLITE_WINDOW_PREFIX, name)
}

/// Whether a host window name belongs to a satellite
pub fn is_satellite_window_name(window_name: &str) -> bool {
    window_name.starts_with(SATELLITE_WINDOW_PREFIX)
}

/// Logical satellite name for a host window name
///
/// Returns the input unchanged when it carries no satellite marker.
pub fn name_from_window_name(window_name: &str) -> &str {
    window_name.strip_prefix(SATELLITE_WINDOW_PREFIX).unwrap_or(window_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_name_round_trip() {
        let host_name = window_name("plots");
        assert_eq!(host_name, "_satellite_plots");
        assert!(is_satellite_window_name(&host_name));
        assert_eq!(name_from_window_name(&host_name), "plots");
    }

    #[test]
    fn test_plain_child_window_name() {
        assert!(!is_satellite_window_name("help-viewer"));
        assert_eq!(name_from_window_name("help-viewer"), "help-viewer");
    }
}
