//! In-memory window host
//!
//! Stands in for the browser or native shell: windows are plain structs that
//! record every message delivered to them. Startup is not automatic; the
//! caller decides when a simulated satellite registers, which is how racy
//! startup orderings are reproduced.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{SatelliteError, SatelliteResult};
use crate::manager::{ClientEvent, SatelliteMessage};

use super::{Geometry, OpenRequest, Point, Size, WindowHandle, WindowHost, WindowId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A satellite window that only lives in memory
#[derive(Debug)]
pub struct SimulatedWindow {
    id: WindowId,
    name: String,
    alive: AtomicBool,
    failing: AtomicBool,
    focus_count: AtomicUsize,
    load_count: AtomicUsize,
    geometry: Mutex<Geometry>,
    inbox: Mutex<Vec<SatelliteMessage>>,
}

impl SimulatedWindow {
    pub fn new(name: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: WindowId::new(),
            name: name.into(),
            alive: AtomicBool::new(true),
            failing: AtomicBool::new(false),
            focus_count: AtomicUsize::new(0),
            load_count: AtomicUsize::new(1),
            geometry: Mutex::new(geometry),
            inbox: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulate the user closing the window behind the coordinator's back
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Make every subsequent delivery fail
    pub fn fail_deliveries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_geometry(&self, geometry: Geometry) {
        *lock(&self.geometry) = geometry;
    }

    pub fn focus_count(&self) -> usize {
        self.focus_count.load(Ordering::SeqCst)
    }

    /// How many times the host loaded content into this window
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    fn reload(&self) {
        self.load_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inbox(&self) -> Vec<SatelliteMessage> {
        lock(&self.inbox).clone()
    }

    pub fn clear_inbox(&self) {
        lock(&self.inbox).clear();
    }

    pub fn received_events(&self) -> Vec<ClientEvent> {
        lock(&self.inbox)
            .iter()
            .filter_map(|message| match message {
                SatelliteMessage::DispatchEvent { event } => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn received_commands(&self) -> Vec<String> {
        lock(&self.inbox)
            .iter()
            .filter_map(|message| match message {
                SatelliteMessage::DispatchCommand { command_id } => Some(command_id.clone()),
                _ => None,
            })
            .collect()
    }

    fn ensure_alive(&self) -> SatelliteResult<()> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(SatelliteError::WindowClosed {
                window: self.name.clone(),
            })
        }
    }
}

impl WindowHandle for SimulatedWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn focus(&self) -> SatelliteResult<()> {
        self.ensure_alive()?;
        self.focus_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> SatelliteResult<()> {
        self.ensure_alive()?;
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn geometry(&self) -> SatelliteResult<Geometry> {
        self.ensure_alive()?;
        Ok(*lock(&self.geometry))
    }

    fn deliver(&self, message: SatelliteMessage) -> SatelliteResult<()> {
        self.ensure_alive()?;
        if self.failing.load(Ordering::SeqCst) {
            return Err(SatelliteError::Delivery {
                name: self.name.clone(),
                message: message.op_name(),
                reason: "satellite handler raised".to_string(),
            });
        }
        lock(&self.inbox).push(message);
        Ok(())
    }
}

/// Window host that creates [`SimulatedWindow`]s
#[derive(Debug)]
pub struct SimulatedHost {
    bounds: Size,
    denying: AtomicBool,
    requests: Mutex<Vec<OpenRequest>>,
    activations: Mutex<Vec<String>>,
    windows: Mutex<HashMap<String, Arc<SimulatedWindow>>>,
}

impl SimulatedHost {
    pub fn new(bounds: Size) -> Self {
        Self {
            bounds,
            denying: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            activations: Mutex::new(Vec::new()),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Silently swallow creation requests, like a popup blocker
    pub fn deny_opens(&self, denying: bool) {
        self.denying.store(denying, Ordering::SeqCst);
    }

    /// Most recent window created for a satellite name
    pub fn latest_window(&self, name: &str) -> Option<Arc<SimulatedWindow>> {
        lock(&self.windows).get(name).cloned()
    }

    /// Names of every satellite a window was ever created for, sorted
    pub fn window_names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.windows).keys().cloned().collect();
        names.sort();
        names
    }

    pub fn requests(&self) -> Vec<OpenRequest> {
        lock(&self.requests).clone()
    }

    pub fn last_request(&self) -> Option<OpenRequest> {
        lock(&self.requests).last().cloned()
    }

    pub fn activations(&self) -> Vec<String> {
        lock(&self.activations).clone()
    }
}

impl WindowHost for SimulatedHost {
    fn open_window(&self, request: OpenRequest) -> SatelliteResult<()> {
        debug!(name = %request.name, size = ?request.size, position = ?request.position, "SimulatedHost::open_window: called");
        lock(&self.requests).push(request.clone());
        if self.denying.load(Ordering::SeqCst) {
            debug!("SimulatedHost::open_window: denied");
            return Ok(());
        }

        let mut windows = lock(&self.windows);
        // opening a live window's name again reloads it in place
        if let Some(existing) = windows.get(&request.name)
            && existing.is_alive()
        {
            existing.reload();
            return Ok(());
        }

        let position = request.position.unwrap_or(Point::new(0, 0));
        let window = SimulatedWindow::new(request.name.clone(), Geometry::new(request.size, position));
        windows.insert(request.name, Arc::new(window));
        Ok(())
    }

    fn activate_by_name(&self, window_name: &str) -> SatelliteResult<()> {
        debug!(%window_name, "SimulatedHost::activate_by_name: called");
        lock(&self.activations).push(window_name.to_string());
        Ok(())
    }

    fn screen_bounds(&self) -> Size {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> OpenRequest {
        OpenRequest {
            name: name.to_string(),
            window_name: format!("_satellite_{}", name),
            size: Size::new(800, 600),
            position: Some(Point::new(10, 20)),
        }
    }

    #[test]
    fn test_open_creates_window_with_geometry() {
        let host = SimulatedHost::new(Size::new(1920, 1080));
        host.open_window(request("plots")).unwrap();

        let window = host.latest_window("plots").unwrap();
        assert_eq!(
            window.geometry().unwrap(),
            Geometry::new(Size::new(800, 600), Point::new(10, 20))
        );
    }

    #[test]
    fn test_reopen_live_window_reloads_in_place() {
        let host = SimulatedHost::new(Size::new(1920, 1080));
        host.open_window(request("plots")).unwrap();
        let first = host.latest_window("plots").unwrap();
        host.open_window(request("plots")).unwrap();

        let second = host.latest_window("plots").unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(second.load_count(), 2);
    }

    #[test]
    fn test_denied_open_records_request_only() {
        let host = SimulatedHost::new(Size::new(1920, 1080));
        host.deny_opens(true);
        host.open_window(request("plots")).unwrap();

        assert_eq!(host.requests().len(), 1);
        assert!(host.latest_window("plots").is_none());
    }

    #[test]
    fn test_dead_window_rejects_operations() {
        let window = SimulatedWindow::new("plots", Geometry::new(Size::new(1, 1), Point::new(0, 0)));
        window.close().unwrap();

        assert!(!window.is_alive());
        assert!(window.close().is_err());
        assert!(window.deliver(SatelliteMessage::NotifyPendingReactivate).is_err());
    }
}
