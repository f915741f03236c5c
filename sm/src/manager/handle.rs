//! CoordinatorHandle - client interface to the satellite coordinator
//!
//! UI actions, the server event pump and satellites all talk to the
//! coordinator through this handle. Each call is queued behind whatever the
//! coordinator is doing and resolves once it has run to completion.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use crate::error::{SatelliteError, SatelliteResult};
use crate::events::{EventBus, ManagerEvent};
use crate::window::{SharedWindow, Size};

use super::callbacks::{CallbackArgs, FLUSH_PENDING_EVENTS, REGISTER_AS_SATELLITE};
use super::messages::{ClientEvent, Command, ManagerMetrics, OpenOutcome, SatelliteRequest};

/// Cloneable handle to a running coordinator
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<SatelliteRequest>,
    events: Arc<EventBus>,
}

impl CoordinatorHandle {
    pub(crate) fn new(tx: mpsc::Sender<SatelliteRequest>, events: Arc<EventBus>) -> Self {
        Self { tx, events }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> SatelliteRequest) -> SatelliteResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| SatelliteError::ChannelError)?;
        reply_rx.await.map_err(|_| SatelliteError::ChannelError)
    }

    /// Open a satellite, reactivating an existing window where possible
    pub async fn open_satellite(
        &self,
        name: &str,
        params: Option<Value>,
        preferred_size: Size,
    ) -> SatelliteResult<OpenOutcome> {
        debug!(%name, ?preferred_size, "CoordinatorHandle::open_satellite: called");
        self.request(|reply| SatelliteRequest::Open {
            name: name.to_string(),
            params,
            preferred_size,
            reply,
        })
        .await?
    }

    /// Destroy and recreate a satellite at its current geometry
    pub async fn force_reopen_satellite(&self, name: &str, params: Option<Value>) -> SatelliteResult<()> {
        debug!(%name, "CoordinatorHandle::force_reopen_satellite: called");
        self.request(|reply| SatelliteRequest::ForceReopen {
            name: name.to_string(),
            params,
            reply,
        })
        .await?
    }

    pub async fn activate_satellite_window(&self, name: &str) -> SatelliteResult<()> {
        debug!(%name, "CoordinatorHandle::activate_satellite_window: called");
        self.request(|reply| SatelliteRequest::Activate {
            name: name.to_string(),
            reply,
        })
        .await
    }

    pub async fn close_satellite_window(&self, name: &str) -> SatelliteResult<()> {
        debug!(%name, "CoordinatorHandle::close_satellite_window: called");
        self.request(|reply| SatelliteRequest::Close {
            name: name.to_string(),
            reply,
        })
        .await
    }

    pub async fn close_all_satellites(&self) -> SatelliteResult<()> {
        debug!("CoordinatorHandle::close_all_satellites: called");
        self.request(|reply| SatelliteRequest::CloseAll { reply }).await
    }

    pub async fn satellite_window_exists(&self, name: &str) -> SatelliteResult<bool> {
        debug!(%name, "CoordinatorHandle::satellite_window_exists: called");
        self.request(|reply| SatelliteRequest::WindowExists {
            name: name.to_string(),
            reply,
        })
        .await
    }

    /// Broadcast an event to satellites
    pub async fn dispatch_event(&self, event: ClientEvent) -> SatelliteResult<()> {
        debug!(event_type = %event.event_type, "CoordinatorHandle::dispatch_event: called");
        self.request(|reply| SatelliteRequest::DispatchEvent { event, reply }).await
    }

    /// Broadcast a command to satellites
    pub async fn dispatch_command(&self, command: Command) -> SatelliteResult<()> {
        debug!(command_id = %command.id, "CoordinatorHandle::dispatch_command: called");
        self.request(|reply| SatelliteRequest::DispatchCommand { command, reply })
            .await
    }

    /// Call a satellite operation by name, as a satellite context would
    pub async fn invoke(&self, op: &str, args: CallbackArgs) -> SatelliteResult<()> {
        debug!(%op, name = %args.name, "CoordinatorHandle::invoke: called");
        self.request(|reply| SatelliteRequest::Invoke {
            op: op.to_string(),
            args,
            reply,
        })
        .await?
    }

    /// Satellite-side registration handshake
    pub async fn register_as_satellite(&self, name: &str, window: SharedWindow) -> SatelliteResult<()> {
        self.invoke(REGISTER_AS_SATELLITE, CallbackArgs::with_window(name, window))
            .await
    }

    /// Satellite-side request for buffered events
    pub async fn flush_pending_events(&self, name: &str) -> SatelliteResult<()> {
        self.invoke(FLUSH_PENDING_EVENTS, CallbackArgs::name(name)).await
    }

    pub async fn update_session_snapshot(&self, snapshot: Value) -> SatelliteResult<()> {
        debug!("CoordinatorHandle::update_session_snapshot: called");
        self.request(|reply| SatelliteRequest::UpdateSession { snapshot, reply })
            .await
    }

    /// Tell the coordinator the main window is closing
    pub async fn main_window_closed(&self) -> SatelliteResult<()> {
        debug!("CoordinatorHandle::main_window_closed: called");
        self.request(|reply| SatelliteRequest::MainWindowClosed { reply }).await
    }

    /// Get current coordinator metrics
    pub async fn metrics(&self) -> SatelliteResult<ManagerMetrics> {
        debug!("CoordinatorHandle::metrics: called");
        self.request(|reply| SatelliteRequest::GetMetrics { reply }).await
    }

    /// Stop the coordinator; satellites are closed on the way out
    pub async fn shutdown(&self) -> SatelliteResult<()> {
        debug!("CoordinatorHandle::shutdown: called");
        self.tx
            .send(SatelliteRequest::Shutdown)
            .await
            .map_err(|_| SatelliteError::ChannelError)
    }

    /// Subscribe to coordinator activity
    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closed_channel_reports_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = CoordinatorHandle::new(tx, Arc::new(EventBus::new(8)));

        let err = handle.close_all_satellites().await.unwrap_err();
        assert!(matches!(err, SatelliteError::ChannelError));
    }

    #[tokio::test]
    async fn test_dropped_reply_reports_error() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = CoordinatorHandle::new(tx, Arc::new(EventBus::new(8)));

        let responder = tokio::spawn(async move {
            // drop the request, and with it the reply sender
            let _ = rx.recv().await;
        });

        let err = handle.metrics().await.unwrap_err();
        assert!(matches!(err, SatelliteError::ChannelError));
        responder.await.unwrap();
    }
}
