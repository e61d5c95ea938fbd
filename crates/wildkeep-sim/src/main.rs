//! Wildkeep headless simulation harness.
//!
//! Usage: `wildkeep-sim [scenario.toml]`. Pass `--write-default <path>` to
//! dump the built-in scenario for editing.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod scenario;

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::app::EventLog;
use crate::config::SimConfig;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("wildkeep=info".parse()?))
        .init();

    info!("Starting Wildkeep simulation");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let first = args.next();
    if first.as_deref() == Some("--write-default") {
        let path = args.next().map_or_else(config::default_config_path, PathBuf::from);
        config::write_default(&path)?;
        return Ok(());
    }

    let path = first.map_or_else(config::default_config_path, PathBuf::from);
    let config = SimConfig::load_from(&path);
    let (mut sim, _) = scenario::build(&config)?;

    let log = EventLog::new();
    let summary = app::run(&mut sim, &config, &log);

    info!(
        "Finished {} ticks ({:.1}s): {} actors remain, {} attacks, {} deaths",
        summary.ticks, summary.elapsed, summary.remaining, summary.attacks, summary.deaths
    );
    Ok(())
}
