//! Scripted sessions against a simulated window host
//!
//! Scenarios make startup races reproducible: the file decides exactly when
//! each satellite registers relative to the events the main window sends.

mod definition;
mod runner;

pub use definition::{Scenario, Step};
pub use runner::{SatelliteReport, ScenarioReport, ScenarioRunner, StepResult};
