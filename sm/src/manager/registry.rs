//! Satellite registry
//!
//! Maps a satellite name to the window currently fulfilling that role. Entries
//! are only added by the registration handshake; dead ones are found by
//! polling and evicted lazily.

use std::fmt;

use tracing::debug;

use crate::window::SharedWindow;

/// A registered satellite window
#[derive(Clone)]
pub struct ActiveSatellite {
    name: String,
    window: SharedWindow,
}

impl ActiveSatellite {
    pub fn new(name: impl Into<String>, window: SharedWindow) -> Self {
        Self {
            name: name.into(),
            window,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn window(&self) -> &SharedWindow {
        &self.window
    }

    pub fn is_alive(&self) -> bool {
        self.window.is_alive()
    }
}

impl PartialEq for ActiveSatellite {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.window.id() == other.window.id()
    }
}

impl Eq for ActiveSatellite {}

impl fmt::Debug for ActiveSatellite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSatellite")
            .field("name", &self.name)
            .field("window", &self.window.id())
            .finish()
    }
}

/// Ordered collection of registered satellites
#[derive(Debug, Default)]
pub struct SatelliteRegistry {
    entries: Vec<ActiveSatellite>,
}

impl SatelliteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// First entry for `name` whose window is still alive
    pub fn find(&self, name: &str) -> Option<ActiveSatellite> {
        self.entries
            .iter()
            .find(|entry| entry.name == name && entry.is_alive())
            .cloned()
    }

    /// Insert or replace the entry for a name
    ///
    /// Re-registering the same (name, window) pair is a no-op. A different
    /// window under an existing name replaces that entry in place.
    pub fn upsert(&mut self, entry: ActiveSatellite) {
        debug!(name = %entry.name, window = %entry.window.id(), "SatelliteRegistry::upsert: called");
        if self.entries.contains(&entry) {
            debug!("SatelliteRegistry::upsert: already registered");
            return;
        }

        match self.entries.iter_mut().find(|existing| existing.name == entry.name) {
            Some(existing) => {
                debug!(previous = %existing.window.id(), "SatelliteRegistry::upsert: replacing window");
                *existing = entry;
            }
            None => self.entries.push(entry),
        }
    }

    /// Evict every entry whose window is no longer alive
    pub fn remove_dead(&mut self) -> Vec<ActiveSatellite> {
        let (alive, dead): (Vec<_>, Vec<_>) = self.entries.drain(..).partition(ActiveSatellite::is_alive);
        self.entries = alive;
        if !dead.is_empty() {
            debug!(count = dead.len(), "SatelliteRegistry::remove_dead: evicted");
        }
        dead
    }

    /// Remove specific entries found dead during a broadcast
    pub fn remove_entries(&mut self, dead: &[ActiveSatellite]) {
        self.entries.retain(|entry| !dead.contains(entry));
    }

    /// Remove every entry registered under `name`
    pub fn remove(&mut self, name: &str) -> Vec<ActiveSatellite> {
        let (removed, kept): (Vec<_>, Vec<_>) = self.entries.drain(..).partition(|entry| entry.name == name);
        self.entries = kept;
        removed
    }

    /// Remove everything, returning what was registered
    pub fn remove_all(&mut self) -> Vec<ActiveSatellite> {
        std::mem::take(&mut self.entries)
    }

    /// Defensive copy for iteration while the registry may change
    pub fn snapshot(&self) -> Vec<ActiveSatellite> {
        self.entries.clone()
    }

    /// Live entries registered under `name`
    pub fn live_entries(&self, name: &str) -> Vec<ActiveSatellite> {
        self.entries
            .iter()
            .filter(|entry| entry.name == name && entry.is_alive())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{Geometry, Point, SimulatedWindow, Size, WindowHandle};
    use std::sync::Arc;

    fn window() -> Arc<SimulatedWindow> {
        Arc::new(SimulatedWindow::new(
            "plots",
            Geometry::new(Size::new(800, 600), Point::new(0, 0)),
        ))
    }

    #[test]
    fn test_upsert_same_pair_is_noop() {
        let mut registry = SatelliteRegistry::new();
        let w = window();

        registry.upsert(ActiveSatellite::new("plots", w.clone()));
        registry.upsert(ActiveSatellite::new("plots", w.clone()));

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_upsert_new_window_replaces() {
        let mut registry = SatelliteRegistry::new();
        let first = window();
        let second = window();

        registry.upsert(ActiveSatellite::new("plots", first));
        registry.upsert(ActiveSatellite::new("plots", second.clone()));

        assert_eq!(registry.len(), 1);
        let found = registry.find("plots").unwrap();
        assert_eq!(found.window().id(), second.id());
    }

    #[test]
    fn test_find_skips_dead_windows() {
        let mut registry = SatelliteRegistry::new();
        let w = window();
        registry.upsert(ActiveSatellite::new("plots", w.clone()));

        w.kill();

        assert!(registry.find("plots").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_dead() {
        let mut registry = SatelliteRegistry::new();
        let dead = window();
        let alive = window();
        registry.upsert(ActiveSatellite::new("plots", dead.clone()));
        registry.upsert(ActiveSatellite::new("viewer", alive));

        dead.kill();
        let evicted = registry.remove_dead();

        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].name(), "plots");
        assert_eq!(registry.names(), vec!["viewer".to_string()]);
    }

    #[test]
    fn test_remove_by_name_and_all() {
        let mut registry = SatelliteRegistry::new();
        registry.upsert(ActiveSatellite::new("plots", window()));
        registry.upsert(ActiveSatellite::new("viewer", window()));

        assert_eq!(registry.remove("plots").len(), 1);
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.remove_all().len(), 1);
        assert!(registry.is_empty());
    }
}
