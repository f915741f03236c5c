//! Coordinator task: serializes every satellite operation
//!
//! The main context owns one [`SatelliteManager`] and feeds it requests from
//! a single channel. A satellite calling back in while the manager is busy
//! just queues behind the current request, so no operation ever observes
//! another one half done.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::events::{EventBus, create_event_bus};
use crate::window::WindowHost;

use super::config::ManagerConfig;
use super::core::SatelliteManager;
use super::handle::CoordinatorHandle;
use super::lifecycle::MainWindowLifecycle;
use super::messages::{OpenOutcome, SatelliteRequest};
use super::platform::Platform;

/// Owns the satellite manager and runs its request loop
pub struct Coordinator {
    config: ManagerConfig,
    manager: SatelliteManager,
    events: Arc<EventBus>,
    tx: mpsc::Sender<SatelliteRequest>,
    rx: mpsc::Receiver<SatelliteRequest>,
}

impl Coordinator {
    /// Create a coordinator for the main window with the callback table
    /// already installed
    pub fn new(config: ManagerConfig, host: Arc<dyn WindowHost>, platform: Platform) -> Self {
        debug!(?config, ?platform, "Coordinator::new: called");
        let (tx, rx) = mpsc::channel(config.channel_buffer.max(1));
        let events = create_event_bus(config.event_bus_capacity);
        let mut manager = SatelliteManager::new(host, platform, events.clone());
        manager.initialize();
        Self {
            config,
            manager,
            events,
            tx,
            rx,
        }
    }

    /// Seed the session snapshot pushed to registering satellites
    pub fn with_session(mut self, snapshot: Value) -> Self {
        self.manager = self.manager.with_session(snapshot);
        self
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.events.clone()
    }

    /// Get a sender for raw requests
    pub fn sender(&self) -> mpsc::Sender<SatelliteRequest> {
        self.tx.clone()
    }

    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle::new(self.tx.clone(), self.events.clone())
    }

    /// Spawn the request loop and return a handle to it
    pub fn spawn(self) -> (CoordinatorHandle, tokio::task::JoinHandle<()>) {
        let handle = self.handle();
        let task = tokio::spawn(self.run());
        (handle, task)
    }

    /// Run the request loop until shutdown
    ///
    /// Satellites are closed on the way out.
    pub async fn run(mut self) {
        let coord_tx = self.tx.clone();
        let open_timeout = self.config.open_timeout();

        info!("Coordinator started");

        while let Some(req) = self.rx.recv().await {
            match req {
                SatelliteRequest::Open {
                    name,
                    params,
                    preferred_size,
                    reply,
                } => {
                    let result = self.manager.open_satellite(&name, params, preferred_size);
                    if let (Ok(OpenOutcome::Opened { generation }), Some(timeout)) = (&result, open_timeout) {
                        let generation = *generation;
                        let timeout_tx = coord_tx.clone();
                        let name = name.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(timeout).await;
                            let _ = timeout_tx
                                .send(SatelliteRequest::OpenTimeout { name, generation })
                                .await;
                        });
                    }
                    let _ = reply.send(result);
                }

                SatelliteRequest::ForceReopen { name, params, reply } => {
                    let _ = reply.send(self.manager.force_reopen_satellite(&name, params));
                }

                SatelliteRequest::Activate { name, reply } => {
                    self.manager.activate_satellite_window(&name);
                    let _ = reply.send(());
                }

                SatelliteRequest::Close { name, reply } => {
                    self.manager.close_satellite_window(&name);
                    let _ = reply.send(());
                }

                SatelliteRequest::CloseAll { reply } => {
                    self.manager.close_all_satellites();
                    let _ = reply.send(());
                }

                SatelliteRequest::DispatchEvent { event, reply } => {
                    self.manager.dispatch_event(event);
                    let _ = reply.send(());
                }

                SatelliteRequest::DispatchCommand { command, reply } => {
                    self.manager.dispatch_command(command);
                    let _ = reply.send(());
                }

                SatelliteRequest::WindowExists { name, reply } => {
                    let _ = reply.send(self.manager.satellite_window_exists(&name));
                }

                SatelliteRequest::Invoke { op, args, reply } => {
                    let _ = reply.send(self.manager.invoke(&op, args));
                }

                SatelliteRequest::UpdateSession { snapshot, reply } => {
                    self.manager.update_session_snapshot(snapshot);
                    let _ = reply.send(());
                }

                SatelliteRequest::MainWindowClosed { reply } => {
                    self.manager.on_main_window_closed();
                    let _ = reply.send(());
                }

                SatelliteRequest::OpenTimeout { name, generation } => {
                    if !self.manager.expire_open(&name, generation) {
                        debug!(%name, generation, "Coordinator::run: open timer no longer relevant");
                    }
                }

                SatelliteRequest::GetMetrics { reply } => {
                    let _ = reply.send(self.manager.metrics());
                }

                SatelliteRequest::Shutdown => {
                    info!("Coordinator shutting down");
                    break;
                }
            }
        }

        self.manager.on_main_window_closed();
        info!("Coordinator stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ManagerEvent;
    use crate::manager::{ClientEvent, Command};
    use crate::window::{SimulatedHost, Size, WindowHandle};
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn host() -> Arc<SimulatedHost> {
        Arc::new(SimulatedHost::new(Size::new(1920, 1080)))
    }

    #[tokio::test]
    async fn test_coordinator_open_register_dispatch() {
        let host = host();
        let coord = Coordinator::new(ManagerConfig::default(), host.clone(), Platform::default());
        let (handle, task) = coord.spawn();

        handle
            .open_satellite("plots", Some(json!({"zoom": 2})), Size::new(800, 600))
            .await
            .unwrap();
        handle
            .dispatch_event(ClientEvent::new("plots_changed", json!({"id": 1})))
            .await
            .unwrap();

        let window = host.latest_window("plots").unwrap();
        handle.register_as_satellite("plots", window.clone()).await.unwrap();
        handle.flush_pending_events("plots").await.unwrap();
        handle.dispatch_command(Command::new("zoomIn")).await.unwrap();

        assert_eq!(window.received_events().len(), 1);
        assert_eq!(window.received_commands(), vec!["zoomIn".to_string()]);
        assert!(handle.satellite_window_exists("plots").await.unwrap());

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.active_satellites, 1);
        assert_eq!(metrics.buffering_satellites, 0);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert!(!window.is_alive());
    }

    #[tokio::test]
    async fn test_coordinator_raw_sender() {
        let coord = Coordinator::new(ManagerConfig::default(), host(), Platform::default());
        let sender = coord.sender();
        let task = tokio::spawn(coord.run());

        let (reply, rx) = oneshot::channel();
        sender.send(SatelliteRequest::GetMetrics { reply }).await.unwrap();
        assert_eq!(rx.await.unwrap().active_satellites, 0);

        sender.send(SatelliteRequest::Shutdown).await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_timeout_discards_buffer() {
        let host = host();
        let config = ManagerConfig {
            open_timeout_secs: Some(5),
            ..Default::default()
        };
        let coord = Coordinator::new(config, host.clone(), Platform::default());
        let (handle, task) = coord.spawn();
        let mut rx = handle.subscribe();

        handle.open_satellite("plots", None, Size::new(800, 600)).await.unwrap();
        handle
            .dispatch_event(ClientEvent::new("console_output", json!({})))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(6)).await;

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.open_timeouts, 1);
        assert_eq!(metrics.buffering_satellites, 0);

        let timed_out = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|event| matches!(event, ManagerEvent::OpenTimedOut { .. }));
        assert_eq!(
            timed_out,
            Some(ManagerEvent::OpenTimedOut {
                name: "plots".to_string(),
                discarded_events: 1,
            })
        );

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_registration_cancels_open_timeout() {
        let host = host();
        let config = ManagerConfig {
            open_timeout_secs: Some(5),
            ..Default::default()
        };
        let coord = Coordinator::new(config, host.clone(), Platform::default());
        let (handle, task) = coord.spawn();

        handle.open_satellite("plots", None, Size::new(800, 600)).await.unwrap();
        let window = host.latest_window("plots").unwrap();
        handle.register_as_satellite("plots", window.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(6)).await;

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.open_timeouts, 0);
        assert_eq!(metrics.buffering_satellites, 1);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_main_window_closed_request() {
        let host = host();
        let coord = Coordinator::new(ManagerConfig::default(), host.clone(), Platform::default())
            .with_session(json!({"session-id": "s1"}));
        let (handle, task) = coord.spawn();

        handle.open_satellite("viewer", None, Size::new(800, 600)).await.unwrap();
        let window = host.latest_window("viewer").unwrap();
        handle.register_as_satellite("viewer", window.clone()).await.unwrap();
        handle.main_window_closed().await.unwrap();

        assert!(!window.is_alive());
        assert!(!handle.satellite_window_exists("viewer").await.unwrap());

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }
}
