//! Scenario file format
//!
//! A scenario is a scripted session: the main window's actions interleaved
//! with what the simulated satellites do, in the order they happen.
//!
//! ```yaml
//! name: plots
//! session: { session-id: abc123 }
//! steps:
//!   - action: open
//!     name: plots
//!     params: { zoom: 2 }
//!   - action: dispatch-event
//!     event-type: plots_changed
//!     data: { id: 1 }
//!   - action: register
//!     name: plots
//!   - action: flush
//!     name: plots
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::manager::Platform;
use crate::window::{Point, Size};

fn default_true() -> bool {
    true
}

/// A scripted session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Overrides the configured platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    /// Session snapshot pushed to satellites as they register
    #[serde(default)]
    pub session: Value,

    pub steps: Vec<Step>,
}

/// One thing that happens during a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    /// Main window opens (or reactivates) a satellite
    Open {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<Size>,
    },

    /// Main window destroys and recreates a satellite in place
    ForceReopen {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Value>,
    },

    /// The satellite's window finished loading and registers
    Register { name: String },

    /// The satellite asks for its buffered events
    Flush { name: String },

    DispatchEvent {
        #[serde(rename = "event-type")]
        event_type: String,
        #[serde(default)]
        data: Value,
    },

    DispatchCommand { id: String },

    /// The user closes the satellite behind the main window's back
    Kill { name: String },

    /// The satellite's handlers start (or stop) failing
    FailDeliveries {
        name: String,
        #[serde(default = "default_true")]
        failing: bool,
    },

    /// The user moves or resizes the satellite
    Move {
        name: String,
        size: Size,
        position: Point,
    },

    Activate { name: String },

    Close { name: String },

    CloseAll,

    UpdateSession { snapshot: Value },

    /// The host starts (or stops) blocking window creation
    DenyOpens {
        #[serde(default = "default_true")]
        deny: bool,
    },

    MainWindowClosed,

    /// Let time pass, for open timeouts
    Wait { ms: u64 },
}

impl Step {
    /// Action name as written in scenario files
    pub fn action(&self) -> &'static str {
        match self {
            Step::Open { .. } => "open",
            Step::ForceReopen { .. } => "force-reopen",
            Step::Register { .. } => "register",
            Step::Flush { .. } => "flush",
            Step::DispatchEvent { .. } => "dispatch-event",
            Step::DispatchCommand { .. } => "dispatch-command",
            Step::Kill { .. } => "kill",
            Step::FailDeliveries { .. } => "fail-deliveries",
            Step::Move { .. } => "move",
            Step::Activate { .. } => "activate",
            Step::Close { .. } => "close",
            Step::CloseAll => "close-all",
            Step::UpdateSession { .. } => "update-session",
            Step::DenyOpens { .. } => "deny-opens",
            Step::MainWindowClosed => "main-window-closed",
            Step::Wait { .. } => "wait",
        }
    }

    /// Satellite this step is about, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            Step::Open { name, .. }
            | Step::ForceReopen { name, .. }
            | Step::Register { name }
            | Step::Flush { name }
            | Step::Kill { name }
            | Step::FailDeliveries { name, .. }
            | Step::Move { name, .. }
            | Step::Activate { name }
            | Step::Close { name } => Some(name),
            _ => None,
        }
    }

    /// Steps that act on a simulated window need one to have been requested
    fn needs_window(&self) -> bool {
        matches!(
            self,
            Step::Register { .. } | Step::Kill { .. } | Step::FailDeliveries { .. } | Step::Move { .. }
        )
    }
}

impl Scenario {
    /// Load and validate a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Scenario::load: called");
        let content = fs::read_to_string(path).context(format!("Failed to read scenario {}", path.display()))?;
        let scenario = Self::parse(&content)?;
        tracing::info!("Loaded scenario '{}' from: {}", scenario.name, path.display());
        Ok(scenario)
    }

    /// Parse and validate scenario YAML
    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Self = serde_yaml::from_str(content).context("Failed to parse scenario")?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check the scenario is well formed before anything runs
    pub fn validate(&self) -> Result<()> {
        debug!(name = %self.name, steps = self.steps.len(), "Scenario::validate: called");
        if self.steps.is_empty() {
            return Err(eyre!("Scenario '{}' has no steps", self.name));
        }

        let mut opened = HashSet::new();
        for (i, step) in self.steps.iter().enumerate() {
            let index = i + 1;
            if let Some(name) = step.target()
                && name.trim().is_empty()
            {
                return Err(eyre!("Step {} ({}): satellite name is empty", index, step.action()));
            }

            match step {
                Step::Open { name, size, .. } => {
                    if let Some(size) = size
                        && (size.width == 0 || size.height == 0)
                    {
                        return Err(eyre!("Step {} (open): size of '{}' must be non-zero", index, name));
                    }
                    opened.insert(name.as_str());
                }
                Step::DispatchEvent { event_type, .. } if event_type.is_empty() => {
                    return Err(eyre!("Step {} (dispatch-event): event-type is empty", index));
                }
                Step::DispatchCommand { id } if id.is_empty() => {
                    return Err(eyre!("Step {} (dispatch-command): id is empty", index));
                }
                _ => {}
            }

            if step.needs_window()
                && let Some(name) = step.target()
                && !opened.contains(name)
            {
                return Err(eyre!(
                    "Step {} ({}): '{}' is never opened before this step",
                    index,
                    step.action(),
                    name
                ));
            }
        }
        Ok(())
    }
}
