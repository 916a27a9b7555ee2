//! Canicas - Marble Sorter Carrier Controller
//!
//! Host binary that drives the marble sorter carrier over a serial link.
//! The operator builds routes through the 3x3 transit grid on a console;
//! the host validates every move, compiles it into axis directives and
//! waits out each transit before the next one.

use std::path::PathBuf;

use clap::Parser;
use embassy_executor::Executor;
use static_cell::StaticCell;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::HostError;

mod channels;
mod config;
mod console;
mod controller;
mod error;
mod link;
mod listener;
mod tasks;

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

/// Marble sorter carrier controller
#[derive(Parser, Debug)]
#[command(name = "canicas", version, about)]
struct Cli {
    /// Machine configuration file (defaults to the built-in machine.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port, overriding the configuration
    #[arg(short, long)]
    port: Option<String>,

    /// Log directives instead of sending them
    #[arg(long)]
    simulate: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), HostError> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Canicas host starting...");

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.serial.port = port;
    }
    let simulate = cli.simulate || config.runtime.simulate;

    let (link, reader) = link::open_link(&config.serial, simulate);
    match reader {
        Some(port) => {
            listener::spawn_listener(port)?;
        }
        None => warn!("No telemetry, marble count is tracked locally"),
    }
    console::spawn_console()?;

    let calibration = config.calibration;
    let poll_interval_ms = config.runtime.poll_interval_ms;

    let executor = EXECUTOR.init(Executor::new());
    executor.run(move |spawner| {
        spawner.spawn(tasks::serial_tx_task(link)).unwrap();
        spawner.spawn(tasks::motion_task(poll_interval_ms)).unwrap();
        spawner.spawn(tasks::controller_task(calibration)).unwrap();
        info!("All tasks spawned, controller running");
    })
}
