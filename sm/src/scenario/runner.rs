//! Drives a scenario through a live coordinator
//!
//! Main-window steps go through the [`CoordinatorHandle`] exactly as UI code
//! would; satellite steps (register, flush) go through the same handle the
//! way a satellite context calls back into the main window. Window-side
//! mischief (kill, failing handlers, moves) pokes the simulated host
//! directly.

use std::future::{self, Future};
use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, Result, eyre};
use serde::Serialize;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::events::{EventLogEntry, ManagerEvent};
use crate::manager::{
    ClientEvent, Command, Coordinator, CoordinatorHandle, ManagerMetrics, OpenOutcome, Platform, SatelliteMessage,
};
use crate::window::{Geometry, SimulatedHost, SimulatedWindow, WindowHandle};

use super::definition::{Scenario, Step};

/// What one step did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub index: usize,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub outcome: String,
}

/// Final state of one simulated satellite window
#[derive(Debug, Clone, Serialize)]
pub struct SatelliteReport {
    pub name: String,
    #[serde(rename = "window-id")]
    pub window_id: String,
    pub alive: bool,
    pub loads: usize,
    pub focused: usize,
    pub inbox: Vec<SatelliteMessage>,
}

/// Everything a scenario run observed
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub platform: Platform,
    pub steps: Vec<StepResult>,
    pub satellites: Vec<SatelliteReport>,
    pub events: Vec<EventLogEntry>,
    pub metrics: ManagerMetrics,
}

impl ScenarioReport {
    pub fn satellite(&self, name: &str) -> Option<&SatelliteReport> {
        self.satellites.iter().find(|s| s.name == name)
    }

    /// Activity events of one kind, in emission order
    pub fn events_of_type(&self, event_type: &str) -> Vec<&ManagerEvent> {
        self.events
            .iter()
            .map(|entry| &entry.event)
            .filter(|event| event.event_type() == event_type)
            .collect()
    }
}

/// Runs scenarios against a fresh simulated host each time
pub struct ScenarioRunner {
    config: Config,
}

impl ScenarioRunner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self, scenario: &Scenario) -> Result<ScenarioReport> {
        self.run_until(scenario, future::pending()).await
    }

    /// Run `scenario`, closing the main window early if `interrupt` resolves
    ///
    /// The remaining steps still run against the torn-down coordinator.
    pub async fn run_until<F>(&self, scenario: &Scenario, interrupt: F) -> Result<ScenarioReport>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(scenario = %scenario.name, "ScenarioRunner::run_until: called");
        scenario.validate()?;

        let platform = scenario.platform.unwrap_or(self.config.platform);
        let host = Arc::new(SimulatedHost::new(self.config.screen));
        let coord = Coordinator::new(self.config.manager.clone(), host.clone(), platform)
            .with_session(scenario.session.clone());
        let (handle, task) = coord.spawn();
        let collector = tokio::spawn(collect_events(handle.subscribe()));
        // an interrupted run tears satellites down like a closing main window
        let interrupt_watch = {
            let handle = handle.clone();
            tokio::spawn(async move {
                interrupt.await;
                info!("Scenario interrupted, closing main window");
                if let Err(e) = handle.main_window_closed().await {
                    warn!(error = %e, "Coordinator already stopped");
                }
            })
        };

        info!(scenario = %scenario.name, platform = %platform_name(&platform), "Running scenario");

        // tear down even when a step fails
        let steps = self.apply_all(&handle, &host, scenario).await;
        let metrics = handle.metrics().await;
        let satellites: Vec<SatelliteReport> = host
            .window_names()
            .iter()
            .filter_map(|name| host.latest_window(name))
            .map(|window| satellite_report(&window))
            .collect();

        interrupt_watch.abort();
        let _ = interrupt_watch.await;
        handle.shutdown().await?;
        drop(handle);
        task.await.context("Coordinator task failed")?;
        let events = collector.await.context("Event collector failed")?;

        let steps = steps?;
        let metrics = metrics?;
        info!(scenario = %scenario.name, steps = steps.len(), events = events.len(), "Scenario complete");
        Ok(ScenarioReport {
            scenario: scenario.name.clone(),
            platform,
            steps,
            satellites,
            events,
            metrics,
        })
    }

    async fn apply_all(
        &self,
        handle: &CoordinatorHandle,
        host: &SimulatedHost,
        scenario: &Scenario,
    ) -> Result<Vec<StepResult>> {
        let mut steps = Vec::with_capacity(scenario.steps.len());
        for (i, step) in scenario.steps.iter().enumerate() {
            let index = i + 1;
            let outcome = self
                .apply(handle, host, step)
                .await
                .context(format!("Step {} ({}) failed", index, step.action()))?;
            debug!(index, action = step.action(), %outcome, "ScenarioRunner::apply_all: step done");
            steps.push(StepResult {
                index,
                action: step.action().to_string(),
                target: step.target().map(str::to_string),
                outcome,
            });
        }
        Ok(steps)
    }

    async fn apply(&self, handle: &CoordinatorHandle, host: &SimulatedHost, step: &Step) -> Result<String> {
        let outcome = match step {
            Step::Open { name, params, size } => {
                let size = size.unwrap_or(self.config.default_size);
                match handle.open_satellite(name, params.clone(), size).await? {
                    OpenOutcome::Reactivated => "reactivated".to_string(),
                    OpenOutcome::Opened { generation } => format!("opened (generation {})", generation),
                }
            }
            Step::ForceReopen { name, params } => {
                handle.force_reopen_satellite(name, params.clone()).await?;
                "reopen requested".to_string()
            }
            Step::Register { name } => {
                let window = live_window(host, name)?;
                handle.register_as_satellite(name, window).await?;
                "registered".to_string()
            }
            Step::Flush { name } => {
                handle.flush_pending_events(name).await?;
                "flushed".to_string()
            }
            Step::DispatchEvent { event_type, data } => {
                handle
                    .dispatch_event(ClientEvent::new(event_type.clone(), data.clone()))
                    .await?;
                "dispatched".to_string()
            }
            Step::DispatchCommand { id } => {
                handle.dispatch_command(Command::new(id.clone())).await?;
                "dispatched".to_string()
            }
            Step::Kill { name } => {
                live_window(host, name)?.kill();
                "killed".to_string()
            }
            Step::FailDeliveries { name, failing } => {
                window(host, name)?.fail_deliveries(*failing);
                let state = if *failing { "failing" } else { "healthy" };
                state.to_string()
            }
            Step::Move { name, size, position } => {
                window(host, name)?.set_geometry(Geometry::new(*size, *position));
                format!("moved to {}x{} at ({}, {})", size.width, size.height, position.x, position.y)
            }
            Step::Activate { name } => {
                handle.activate_satellite_window(name).await?;
                "activated".to_string()
            }
            Step::Close { name } => {
                handle.close_satellite_window(name).await?;
                "closed".to_string()
            }
            Step::CloseAll => {
                handle.close_all_satellites().await?;
                "closed all".to_string()
            }
            Step::UpdateSession { snapshot } => {
                handle.update_session_snapshot(snapshot.clone()).await?;
                "session updated".to_string()
            }
            Step::DenyOpens { deny } => {
                host.deny_opens(*deny);
                let state = if *deny { "denying opens" } else { "allowing opens" };
                state.to_string()
            }
            Step::MainWindowClosed => {
                handle.main_window_closed().await?;
                "main window closed".to_string()
            }
            Step::Wait { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                format!("waited {}ms", ms)
            }
        };
        Ok(outcome)
    }
}

fn platform_name(platform: &Platform) -> String {
    match platform {
        Platform::NativeShell => "native-shell".to_string(),
        Platform::Browser { engine } => format!("browser/{:?}", engine).to_lowercase(),
    }
}

fn window(host: &SimulatedHost, name: &str) -> Result<Arc<SimulatedWindow>> {
    host.latest_window(name)
        .ok_or_else(|| eyre!("No window was created for '{}' (opens denied?)", name))
}

fn live_window(host: &SimulatedHost, name: &str) -> Result<Arc<SimulatedWindow>> {
    let window = window(host, name)?;
    if !window.is_alive() {
        return Err(eyre!("Window for '{}' is already closed", name));
    }
    Ok(window)
}

fn satellite_report(window: &SimulatedWindow) -> SatelliteReport {
    SatelliteReport {
        name: window.name().to_string(),
        window_id: window.id().to_string(),
        alive: window.is_alive(),
        loads: window.load_count(),
        focused: window.focus_count(),
        inbox: window.inbox(),
    }
}

/// Record every activity event until the bus closes
async fn collect_events(mut rx: Receiver<ManagerEvent>) -> Vec<EventLogEntry> {
    let mut entries = Vec::new();
    loop {
        match rx.recv().await {
            Ok(event) => entries.push(EventLogEntry::new(event)),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event collector lagged, events lost");
            }
            Err(RecvError::Closed) => break,
        }
    }
    entries
}
