//! Waypoint Runner
//!
//! Loads the arm control library, connects to the controller, configures
//! the arm and moves it through every waypoint in the data file.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use waypoint_runner::{library, RunReport, RunnerConfig, RunnerError, SimulatedArm, WaypointRunner, WaypointSet};

const EXIT_STOPPED: u8 = 130;

#[derive(Parser)]
#[command(name = "waypoint-runner")]
#[command(about = "Move a RealMan arm through a list of waypoints")]
#[command(version)]
struct Args {
    /// Path to the runner configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Controller address (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Controller port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Path to the arm control library (overrides the config file)
    #[arg(long)]
    library: Option<PathBuf>,

    /// Waypoint JSON file (overrides the config file)
    #[arg(short, long)]
    waypoints: Option<PathBuf>,

    /// Move velocity in percent (overrides the config file)
    #[arg(long)]
    velocity: Option<u8>,

    /// Run against a simulated arm instead of the native library
    #[arg(long)]
    simulate: bool,

    /// Validate configuration and waypoints, then exit without moving
    #[arg(long)]
    check: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn get_config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| std::env::var_os("WAYPOINT_RUNNER_CONFIG").map(PathBuf::from))
    }

    fn load_config(&self) -> Result<RunnerConfig> {
        let mut config = match self.get_config_path() {
            Some(path) => {
                info!("Using config: {}", path.display());
                RunnerConfig::load_from_path(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?
            }
            None => {
                info!("No config file given, using built-in defaults");
                RunnerConfig::default()
            }
        };

        if let Some(host) = &self.host {
            config.connection.host = host.clone();
        }
        if let Some(port) = self.port {
            config.connection.port = port;
        }
        if let Some(library) = &self.library {
            config.library.path = library.clone();
        }
        if let Some(waypoints) = &self.waypoints {
            config.waypoints.path = waypoints.clone();
        }
        if let Some(velocity) = self.velocity {
            config.motion.velocity = velocity;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .downcast_ref::<RunnerError>()
                .map(RunnerError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let config = args.load_config()?;
    let waypoints = WaypointSet::load(&config.waypoints.path)?;
    info!(
        "Loaded {} waypoints from {}",
        waypoints.len(),
        config.waypoints.path.display()
    );

    let stop = Arc::new(AtomicBool::new(false));
    let runner = WaypointRunner::new(&config).with_stop_signal(&stop);

    if args.check {
        runner.preflight(&waypoints)?;
        info!("Configuration and waypoints are valid: {}", waypoints.labels().join(", "));
        return Ok(ExitCode::SUCCESS);
    }

    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::Relaxed);
    })
    .context("Failed to install Ctrl+C handler")?;

    let report = if args.simulate {
        info!("Running against simulated arm");
        let arm = SimulatedArm::new();
        runner.execute(&waypoints, |_| Ok(&arm))?
    } else {
        runner.execute(&waypoints, |lib| library::acquire(&lib.path, lib.init_mode))?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(exit_code_for(&report))
}

fn exit_code_for(report: &RunReport) -> ExitCode {
    if let Some(failure) = report.first_failure() {
        error!("{} of the moves failed; first: {}", report.failed.len(), failure);
        return ExitCode::from(failure.exit_code());
    }
    if report.stopped {
        warn!("Run stopped by operator");
        return ExitCode::from(EXIT_STOPPED);
    }
    ExitCode::SUCCESS
}
