use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use satellite::cli::{Cli, Command, OutputFormat, get_log_path};
use satellite::config::Config;
use satellite::events::ManagerEvent;
use satellite::manager::SatelliteMessage;
use satellite::scenario::{Scenario, ScenarioReport, ScenarioRunner};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Can't log here yet, logging isn't initialized
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log level comes from the config file before the full load
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(platform = ?config.platform, "sm loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Run { scenario, format } => {
            debug!(scenario = %scenario.display(), %format, "main: matched Run command");
            cmd_run(config, &scenario, format).await
        }
        Command::Check { scenario } => {
            debug!(scenario = %scenario.display(), "main: matched Check command");
            cmd_check(&scenario)
        }
        Command::Config => {
            debug!("main: matched Config command");
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

/// Run a scenario and print the report
async fn cmd_run(config: Config, path: &Path, format: OutputFormat) -> Result<()> {
    debug!(path = %path.display(), "cmd_run: called");
    let scenario = Scenario::load(path)?;
    let report = ScenarioRunner::new(config).run_until(&scenario, shutdown_signal()).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print_report(&report),
    }
    Ok(())
}

/// Validate a scenario file
fn cmd_check(path: &Path) -> Result<()> {
    debug!(path = %path.display(), "cmd_check: called");
    let scenario = Scenario::load(path)?;
    println!(
        "{} Scenario '{}' is valid ({} steps)",
        "✓".green(),
        scenario.name.cyan(),
        scenario.steps.len()
    );
    Ok(())
}

/// Wait for SIGINT or SIGTERM; the run treats either as the main window closing
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => debug!("shutdown_signal: SIGINT received"),
                    _ = sigterm.recv() => debug!("shutdown_signal: SIGTERM received"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                debug!("shutdown_signal: SIGINT received");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        debug!("shutdown_signal: ctrl_c received");
    }
}

fn print_report(report: &ScenarioReport) {
    println!("Scenario: {}", report.scenario.cyan());
    println!();

    println!("{}", "Steps".bold());
    for step in &report.steps {
        let target = step.target.as_deref().unwrap_or("");
        println!(
            "  {:>3}. {:<20} {:<12} {}",
            step.index,
            step.action.yellow(),
            target,
            step.outcome.dimmed()
        );
    }
    println!();

    println!("{}", "Satellites".bold());
    if report.satellites.is_empty() {
        println!("  No satellite windows were created");
    }
    for satellite in &report.satellites {
        let state = if satellite.alive {
            "open".green()
        } else {
            "closed".red()
        };
        println!(
            "  {} [{}] loads={} focused={}",
            satellite.name.cyan(),
            state,
            satellite.loads,
            satellite.focused
        );
        for message in &satellite.inbox {
            println!("    {} {}", "←".dimmed(), describe_message(message));
        }
    }
    println!();

    let failures: Vec<&ManagerEvent> = report
        .events
        .iter()
        .map(|entry| &entry.event)
        .filter(|event| matches!(event, ManagerEvent::DeliveryFailed { .. } | ManagerEvent::OpenTimedOut { .. }))
        .collect();
    if !failures.is_empty() {
        println!("{}", "Problems".bold());
        for event in failures {
            println!("  {} {} {}", "✗".red(), event.event_type(), event.name());
        }
        println!();
    }

    let m = &report.metrics;
    println!("{}", "Metrics".bold());
    println!("  Opens requested:      {}", m.opens_requested);
    println!("  Reactivations:        {}", m.reactivations);
    println!("  Events dispatched:    {}", m.events_dispatched);
    println!("  Events buffered:      {}", m.events_buffered);
    println!("  Commands dispatched:  {}", m.commands_dispatched);
    println!("  Commands dropped:     {}", m.commands_dropped);
    println!("  Deliveries failed:    {}", m.deliveries_failed);
    println!("  Dead windows evicted: {}", m.dead_handles_evicted);
    println!("  Open timeouts:        {}", m.open_timeouts);
}

fn describe_message(message: &SatelliteMessage) -> String {
    match message {
        SatelliteMessage::SetSessionSnapshot { .. } => "session snapshot".to_string(),
        SatelliteMessage::SetStartupParams { params } => format!("startup params {}", params),
        SatelliteMessage::NotifyReactivated { params: Some(params) } => format!("reactivated {}", params),
        SatelliteMessage::NotifyReactivated { params: None } => "reactivated".to_string(),
        SatelliteMessage::NotifyPendingReactivate => "pending reactivate".to_string(),
        SatelliteMessage::DispatchEvent { event } => format!("event {} {}", event.event_type, event.data),
        SatelliteMessage::DispatchCommand { command_id } => format!("command {}", command_id),
    }
}
