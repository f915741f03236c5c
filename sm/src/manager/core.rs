//! Satellite manager: open, reactivate, register, dispatch, tear down
//!
//! All state lives here and is mutated only by the main context. Every
//! operation runs to completion; the only waiting is the buffering state
//! between an open request and the satellite's registration.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{SatelliteError, SatelliteResult};
use crate::events::{EventBus, ManagerEvent};
use crate::window::{OpenRequest, Point, SharedWindow, Size, WindowHost, naming};

use super::callbacks::{
    CallbackArgs, CallbackTable, FLUSH_PENDING_EVENTS, REGISTER_AS_SATELLITE, REGISTER_CHILD_WINDOW,
    UNREGISTER_CHILD_WINDOW,
};
use super::messages::{ClientEvent, Command, ManagerMetrics, OpenOutcome, SatelliteMessage};
use super::params::ParameterStore;
use super::pending::PendingEventBuffer;
use super::platform::{Platform, ReactivationPolicy};
use super::registry::{ActiveSatellite, SatelliteRegistry};

/// Which kind of window this manager is running in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowContext {
    #[default]
    Main,
    Satellite,
}

/// Coordinates satellite windows on behalf of the main window
pub struct SatelliteManager {
    context: WindowContext,
    platform: Platform,
    host: Arc<dyn WindowHost>,
    events: Arc<EventBus>,
    session: Value,
    registry: SatelliteRegistry,
    pending: PendingEventBuffer,
    params: ParameterStore,
    callbacks: CallbackTable,
    /// Open requests not yet answered by a registration, by name
    open_generations: HashMap<String, u64>,
    next_generation: u64,
    metrics: ManagerMetrics,
}

impl SatelliteManager {
    pub fn new(host: Arc<dyn WindowHost>, platform: Platform, events: Arc<EventBus>) -> Self {
        debug!(?platform, "SatelliteManager::new: called");
        Self {
            context: WindowContext::Main,
            platform,
            host,
            events,
            session: Value::Null,
            registry: SatelliteRegistry::new(),
            pending: PendingEventBuffer::new(),
            params: ParameterStore::new(),
            callbacks: CallbackTable::new(),
            open_generations: HashMap::new(),
            next_generation: 0,
            metrics: ManagerMetrics::default(),
        }
    }

    pub fn with_context(mut self, context: WindowContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_session(mut self, snapshot: Value) -> Self {
        self.session = snapshot;
        self
    }

    /// Install the satellite callback table
    ///
    /// Called once by the main window during startup. Calling it again leaves
    /// the existing table in place.
    pub fn initialize(&mut self) {
        debug!("SatelliteManager::initialize: called");
        self.callbacks.install(REGISTER_AS_SATELLITE, |manager, args| {
            let window = args.require_window(REGISTER_AS_SATELLITE)?;
            manager.register_as_satellite(&args.name, window);
            Ok(())
        });
        self.callbacks.install(FLUSH_PENDING_EVENTS, |manager, args| {
            manager.flush_pending_events(&args.name);
            Ok(())
        });
        self.callbacks.install(REGISTER_CHILD_WINDOW, |manager, args| {
            let window = args.require_window(REGISTER_CHILD_WINDOW)?;
            manager.register_child_window(&args.name, window);
            Ok(())
        });
        self.callbacks.install(UNREGISTER_CHILD_WINDOW, |manager, args| {
            manager.unregister_child_window(&args.name);
            Ok(())
        });
        info!(ops = ?self.callbacks.ops(), "Satellite callbacks installed");
    }

    /// Entry point for satellite-originated calls
    pub fn invoke(&mut self, op: &str, args: CallbackArgs) -> SatelliteResult<()> {
        debug!(%op, name = %args.name, "SatelliteManager::invoke: called");
        let callback = self
            .callbacks
            .get(op)
            .ok_or_else(|| SatelliteError::UnknownOperation { op: op.to_string() })?;
        callback(self, args)
    }

    // === Open / reactivate ===

    /// Open a satellite, reactivating an existing window where possible
    pub fn open_satellite(
        &mut self,
        name: &str,
        params: Option<Value>,
        preferred_size: Size,
    ) -> SatelliteResult<OpenOutcome> {
        self.open_satellite_with(name, params, preferred_size, true, None)
    }

    fn open_satellite_with(
        &mut self,
        name: &str,
        params: Option<Value>,
        preferred_size: Size,
        adjust_size: bool,
        position: Option<Point>,
    ) -> SatelliteResult<OpenOutcome> {
        debug!(%name, ?preferred_size, adjust_size, ?position, "SatelliteManager::open_satellite: called");

        // forwarding of server calls and events does not cascade through
        // satellites, so only the main window may open them
        if self.context == WindowContext::Satellite {
            error!(%name, "Satellite windows can't launch other satellites");
            return Err(SatelliteError::NotMainWindow { name: name.to_string() });
        }

        if let Some(existing) = self.registry.find(name) {
            match self.platform.reactivation_policy() {
                ReactivationPolicy::HostActivate => {
                    debug!(%name, "SatelliteManager::open_satellite: activating via host shell");
                    if let Err(e) = self.host.activate_by_name(&naming::window_name(name)) {
                        warn!(%name, error = %e, "Host failed to activate satellite");
                    }
                    self.reactivated(&existing, params);
                    return Ok(OpenOutcome::Reactivated);
                }
                ReactivationPolicy::Refocus => {
                    debug!(%name, "SatelliteManager::open_satellite: refocusing existing window");
                    if let Err(e) = existing.window().focus() {
                        warn!(%name, error = %e, "Failed to focus satellite");
                    }
                    self.reactivated(&existing, params);
                    return Ok(OpenOutcome::Reactivated);
                }
                ReactivationPolicy::Reopen => {
                    debug!(%name, "SatelliteManager::open_satellite: engine can't refocus, reopening");
                    self.deliver(name, existing.window(), SatelliteMessage::NotifyPendingReactivate);
                }
            }
        }

        // read back by the satellite during registration
        if let Some(params) = params {
            self.params.set(name, params);
        }

        // buffer before the window exists so nothing fired during load is lost
        self.pending.begin_buffering(name);

        let size = if adjust_size {
            preferred_size.clamp_to(self.host.screen_bounds())
        } else {
            preferred_size
        };

        self.next_generation += 1;
        let generation = self.next_generation;
        self.open_generations.insert(name.to_string(), generation);
        self.metrics.opens_requested += 1;

        let request = OpenRequest {
            name: name.to_string(),
            window_name: naming::window_name(name),
            size,
            position,
        };
        info!(%name, width = size.width, height = size.height, "Opening satellite window");
        if let Err(e) = self.host.open_window(request) {
            warn!(%name, error = %e, "Window creation request failed");
        }
        self.events.emit(ManagerEvent::SatelliteOpening {
            name: name.to_string(),
            width: size.width,
            height: size.height,
        });

        Ok(OpenOutcome::Opened { generation })
    }

    fn reactivated(&mut self, satellite: &ActiveSatellite, params: Option<Value>) {
        self.metrics.reactivations += 1;
        self.deliver(
            satellite.name(),
            satellite.window(),
            SatelliteMessage::NotifyReactivated { params },
        );
        self.events.emit(ManagerEvent::SatelliteReactivated {
            name: satellite.name().to_string(),
        });
    }

    /// Destroy a live satellite and open a replacement at the same geometry
    ///
    /// Last resort for engines that refuse to refocus outside a user
    /// gesture. Nothing happens when no live window exists for `name`.
    pub fn force_reopen_satellite(&mut self, name: &str, params: Option<Value>) -> SatelliteResult<()> {
        debug!(%name, "SatelliteManager::force_reopen_satellite: called");
        let Some(existing) = self.registry.find(name) else {
            debug!(%name, "SatelliteManager::force_reopen_satellite: no live window");
            return Ok(());
        };

        let geometry = match existing.window().geometry() {
            Ok(geometry) => geometry,
            Err(e) => {
                warn!(%name, error = %e, "Could not read satellite geometry, not reopening");
                return Ok(());
            }
        };

        self.deliver(name, existing.window(), SatelliteMessage::NotifyPendingReactivate);
        if let Err(e) = existing.window().close() {
            debug!(%name, error = %e, "SatelliteManager::force_reopen_satellite: close failed");
        }

        self.open_satellite_with(name, params, geometry.size, false, Some(geometry.position))
            .map(|_| ())
    }

    // === Queries and single-window operations ===

    pub fn satellite_window_exists(&self, name: &str) -> bool {
        self.registry.find(name).is_some()
    }

    /// Live window registered under `name`
    pub fn satellite_window(&self, name: &str) -> Option<SharedWindow> {
        self.registry.find(name).map(|satellite| satellite.window().clone())
    }

    /// Bring a satellite to the front without notifying it
    pub fn activate_satellite_window(&mut self, name: &str) {
        debug!(%name, "SatelliteManager::activate_satellite_window: called");
        let result = if self.platform.is_native_shell() {
            self.host.activate_by_name(&naming::window_name(name))
        } else {
            match self.registry.find(name) {
                Some(satellite) => satellite.window().focus(),
                None => Ok(()),
            }
        };
        if let Err(e) = result {
            warn!(%name, error = %e, "Failed to activate satellite");
        }
    }

    /// Close one satellite; its registry entry goes on the next sweep
    ///
    /// A satellite still starting up stops buffering and its queue is dropped.
    pub fn close_satellite_window(&mut self, name: &str) {
        debug!(%name, "SatelliteManager::close_satellite_window: called");
        self.open_generations.remove(name);
        let discarded = self.pending.discard(name);
        if discarded > 0 {
            info!(%name, discarded, "Discarded pending events for closed satellite");
        }

        let Some(satellite) = self.registry.find(name) else {
            return;
        };
        match satellite.window().close() {
            Ok(()) => self.events.emit(ManagerEvent::SatelliteClosed { name: name.to_string() }),
            Err(e) => warn!(%name, error = %e, "Failed to close satellite"),
        }
    }

    /// Close every satellite and forget all pending events
    ///
    /// Buffered queues are discarded, not flushed.
    pub fn close_all_satellites(&mut self) {
        debug!("SatelliteManager::close_all_satellites: called");
        let satellites = self.registry.remove_all();
        for satellite in &satellites {
            if let Err(e) = satellite.window().close() {
                debug!(name = %satellite.name(), error = %e, "SatelliteManager::close_all_satellites: close failed");
            }
        }
        self.pending.clear();
        self.open_generations.clear();
        info!(count = satellites.len(), "Closed all satellites");
        self.events.emit(ManagerEvent::AllSatellitesClosed {
            count: satellites.len(),
        });
    }

    // === Registration handshake ===

    /// Called by a satellite once it can receive messages
    pub fn register_as_satellite(&mut self, name: &str, window: SharedWindow) {
        debug!(%name, window = %window.id(), "SatelliteManager::register_as_satellite: called");
        // a reloaded satellite may already be registered with this window
        self.registry.upsert(ActiveSatellite::new(name, window.clone()));
        self.open_generations.remove(name);

        self.deliver(
            name,
            &window,
            SatelliteMessage::SetSessionSnapshot {
                snapshot: self.session.clone(),
            },
        );

        if let Some(params) = self.params.get(name).cloned() {
            self.deliver(name, &window, SatelliteMessage::SetStartupParams { params });
        }

        info!(%name, "Satellite registered");
        self.events.emit(ManagerEvent::SatelliteRegistered {
            name: name.to_string(),
            window_id: window.id().to_string(),
        });
    }

    /// Called by a satellite once it is ready for steady-state traffic
    pub fn flush_pending_events(&mut self, name: &str) {
        debug!(%name, "SatelliteManager::flush_pending_events: called");
        let events = self.pending.drain_and_stop(name);
        if events.is_empty() {
            return;
        }

        let count = events.len();
        for satellite in self.registry.live_entries(name) {
            for event in &events {
                self.deliver(
                    name,
                    satellite.window(),
                    SatelliteMessage::DispatchEvent { event: event.clone() },
                );
            }
        }
        self.events.emit(ManagerEvent::PendingEventsFlushed {
            name: name.to_string(),
            count,
        });
    }

    /// Report a non-satellite child window
    pub fn register_child_window(&mut self, name: &str, window: SharedWindow) {
        debug!(%name, "SatelliteManager::register_child_window: called");
        self.events.emit(ManagerEvent::ChildWindowOpened {
            name: name.to_string(),
            window_id: window.id().to_string(),
        });
    }

    /// Report a child window going away, by host window name
    pub fn unregister_child_window(&mut self, window_name: &str) {
        debug!(
            %window_name,
            satellite = naming::is_satellite_window_name(window_name),
            "SatelliteManager::unregister_child_window: called"
        );
        let name = naming::name_from_window_name(window_name);
        self.events.emit(ManagerEvent::ChildWindowClosed { name: name.to_string() });
    }

    // === Broadcast ===

    /// Deliver an event to every active satellite, buffering for those
    /// still starting up
    pub fn dispatch_event(&mut self, event: ClientEvent) {
        debug!(event_type = %event.event_type, "SatelliteManager::dispatch_event: called");
        self.sweep();
        let dead = self.broadcast(|| SatelliteMessage::DispatchEvent { event: event.clone() });
        self.metrics.events_dispatched += 1;
        self.evict(dead);

        let buffered = self.pending.enqueue_all(&event);
        self.metrics.events_buffered += buffered as u64;
    }

    /// Deliver a command to every active satellite
    ///
    /// Satellites still starting up never see it: commands are not buffered.
    pub fn dispatch_command(&mut self, command: Command) {
        debug!(command_id = %command.id, "SatelliteManager::dispatch_command: called");
        self.sweep();
        let dead = self.broadcast(|| SatelliteMessage::DispatchCommand {
            command_id: command.id.clone(),
        });
        self.metrics.commands_dispatched += 1;
        self.evict(dead);

        let dropped = self.pending.len();
        if dropped > 0 {
            debug!(command_id = %command.id, dropped, "SatelliteManager::dispatch_command: dropped for buffering satellites");
            self.metrics.commands_dropped += dropped as u64;
        }
    }

    /// Send to every registered, non-buffering, live satellite; return the
    /// dead entries found on the way
    fn broadcast(&mut self, message: impl Fn() -> SatelliteMessage) -> Vec<ActiveSatellite> {
        // iterate a copy: a satellite's handler may call back into us
        let satellites = self.registry.snapshot();
        let mut dead = Vec::new();
        for satellite in satellites {
            if self.pending.is_buffering(satellite.name()) {
                continue;
            }
            if !satellite.is_alive() {
                dead.push(satellite);
                continue;
            }
            self.deliver(satellite.name(), satellite.window(), message());
        }
        dead
    }

    /// Drop entries whose windows died since the last look
    fn sweep(&mut self) {
        let dead = self.registry.remove_dead();
        self.report_evicted(dead);
    }

    /// Drop entries found dead in the middle of a broadcast
    fn evict(&mut self, dead: Vec<ActiveSatellite>) {
        if dead.is_empty() {
            return;
        }
        self.registry.remove_entries(&dead);
        self.report_evicted(dead);
    }

    fn report_evicted(&mut self, dead: Vec<ActiveSatellite>) {
        for satellite in dead {
            debug!(name = %satellite.name(), "SatelliteManager::evict: window closed, removing");
            self.metrics.dead_handles_evicted += 1;
            self.events.emit(ManagerEvent::DeadWindowEvicted {
                name: satellite.name().to_string(),
            });
        }
    }

    /// Deliver one message, reporting failure instead of propagating it
    fn deliver(&mut self, name: &str, window: &SharedWindow, message: SatelliteMessage) -> bool {
        let op = message.op_name();
        match window.deliver(message) {
            Ok(()) => true,
            Err(e) => {
                warn!(%name, %op, error = %e, "Satellite delivery failed");
                self.metrics.deliveries_failed += 1;
                self.events.emit(ManagerEvent::DeliveryFailed {
                    name: name.to_string(),
                    message: op.to_string(),
                    error: e.to_string(),
                });
                false
            }
        }
    }

    // === Session, timeouts, metrics ===

    /// Replace the snapshot pushed to satellites as they register
    pub fn update_session_snapshot(&mut self, snapshot: Value) {
        debug!("SatelliteManager::update_session_snapshot: called");
        self.session = snapshot;
    }

    /// Give up on an open that never registered
    ///
    /// Only the open identified by `generation` is expired; a later open of
    /// the same name or a registration in the meantime makes this a no-op.
    pub fn expire_open(&mut self, name: &str, generation: u64) -> bool {
        debug!(%name, generation, "SatelliteManager::expire_open: called");
        if self.open_generations.get(name) != Some(&generation) {
            return false;
        }
        self.open_generations.remove(name);
        if !self.pending.is_buffering(name) {
            return false;
        }

        let discarded_events = self.pending.discard(name);
        warn!(%name, discarded_events, "Satellite never registered, discarding buffered events");
        self.metrics.open_timeouts += 1;
        self.events.emit(ManagerEvent::OpenTimedOut {
            name: name.to_string(),
            discarded_events,
        });
        true
    }

    pub fn metrics(&self) -> ManagerMetrics {
        ManagerMetrics {
            active_satellites: self.registry.len(),
            buffering_satellites: self.pending.len(),
            ..self.metrics.clone()
        }
    }

    pub fn is_buffering(&self, name: &str) -> bool {
        self.pending.is_buffering(name)
    }

    pub fn pending_count(&self, name: &str) -> usize {
        self.pending.pending_count(name)
    }

    pub fn buffering_names(&self) -> Vec<String> {
        self.pending.buffering_names()
    }

    pub fn registered_names(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn startup_params(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}
