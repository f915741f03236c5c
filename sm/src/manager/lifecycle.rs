//! Main-window lifecycle hook
//!
//! When the main window goes away every satellite goes with it. Buffered
//! events for satellites still starting up are dropped, not flushed.

use tracing::info;

use super::core::SatelliteManager;

/// Reaction to the main window closing
pub trait MainWindowLifecycle {
    fn on_main_window_closed(&mut self);
}

impl MainWindowLifecycle for SatelliteManager {
    fn on_main_window_closed(&mut self) {
        info!("Main window closed, tearing down satellites");
        self.close_all_satellites();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::manager::Platform;
    use crate::window::{SimulatedHost, Size};
    use std::sync::Arc;

    #[test]
    fn test_main_window_close_cascades() {
        let host = Arc::new(SimulatedHost::new(Size::new(1920, 1080)));
        let mut manager = SatelliteManager::new(host.clone(), Platform::default(), Arc::new(EventBus::new(8)));
        manager.open_satellite("plots", None, Size::new(800, 600)).unwrap();
        let window = host.latest_window("plots").unwrap();
        manager.register_as_satellite("plots", window.clone());
        manager.open_satellite("viewer", None, Size::new(800, 600)).unwrap();

        manager.on_main_window_closed();

        assert!(!crate::window::WindowHandle::is_alive(window.as_ref()));
        assert!(manager.registered_names().is_empty());
        assert!(manager.buffering_names().is_empty());
    }
}
