//! Pulse exporter binary.
//!
//! Wires the snapshot scheduler to a host world and keeps it running until
//! the process is asked to stop. Without a live host attached it drives the
//! in-memory demo world, which is enough to feed a map viewer pointed at
//! the output directory.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from the path given as the first argument
//!    (default `pulse-config.json`)
//! 3. Generate the demo world and start it wandering
//! 4. Create the scheduler and arm the enabled jobs
//! 5. Watch the config file for changes
//! 6. Wait for Ctrl-C or SIGTERM, then stop the jobs

mod demo;
mod error;
mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pulse_core::{JobKind, Scheduler, SnapshotConfig};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::demo::DemoWorld;
use crate::error::EngineError;
use crate::watch::ConfigWatcher;

/// Config file used when no path argument is given.
const DEFAULT_CONFIG_PATH: &str = "pulse-config.json";

/// How often the config file's modification time is checked.
const WATCH_PERIOD: Duration = Duration::from_secs(2);

/// How often the demo world advances.
const WANDER_PERIOD: Duration = Duration::from_secs(1);

/// Demo world population.
const DEMO_PLAYERS: usize = 60;
/// Demo world loaded landblocks.
const DEMO_REGIONS: usize = 24;

/// Application entry point for the exporter.
///
/// # Errors
///
/// Returns an error if the configuration is unusable, the scheduler cannot
/// be created, or signal handlers cannot be installed.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("pulse-engine starting");

    // 2. Load configuration.
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&config_path)?;
    for kind in JobKind::ALL {
        let settings = config.job(kind);
        info!(
            job = %kind,
            enabled = settings.enabled,
            interval_seconds = settings.interval_seconds,
            max_records = %settings.max_records,
            output = %Path::new(settings.output_path).join(settings.output_file).display(),
            "Configuration loaded"
        );
    }

    // 3. Demo world.
    let mut rng = SmallRng::seed_from_u64(rand::random());
    let world = Arc::new(DemoWorld::generate(&mut rng, DEMO_PLAYERS, DEMO_REGIONS));
    info!(players = DEMO_PLAYERS, regions = DEMO_REGIONS, "Demo world generated");

    let wander_world = Arc::clone(&world);
    let wander = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(WANDER_PERIOD);
        loop {
            ticker.tick().await;
            wander_world.wander(&mut rng);
        }
    });

    // 4. Scheduler.
    let scheduler = Arc::new(Scheduler::new(
        config.clone(),
        Arc::clone(&world) as _,
        Arc::clone(&world) as _,
    )?);
    scheduler.start(config);

    // 5. Hot reload.
    let watcher = tokio::spawn(
        ConfigWatcher::new(&config_path).run(Arc::clone(&scheduler), WATCH_PERIOD),
    );

    // 6. Run until asked to stop.
    shutdown_signal().await?;

    watcher.abort();
    wander.abort();
    scheduler.stop();
    info!("pulse-engine shutdown complete");

    Ok(())
}

/// Load and validate the config file, falling back to defaults when it
/// does not exist.
fn load_config(path: &Path) -> Result<SnapshotConfig, EngineError> {
    if path.exists() {
        let config = watch::load_validated(path)?;
        info!(path = %path.display(), "Config file loaded");
        Ok(config)
    } else {
        warn!(path = %path.display(), "Config file not found, using defaults");
        Ok(SnapshotConfig::default())
    }
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() -> Result<(), EngineError> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate =
            signal(SignalKind::terminate()).map_err(|source| EngineError::Signal { source })?;
        tokio::select! {
            result = ctrl_c => {
                result.map_err(|source| EngineError::Signal { source })?;
                info!("Received Ctrl-C, stopping snapshot jobs");
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM, stopping snapshot jobs");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.map_err(|source| EngineError::Signal { source })?;
        info!("Received Ctrl-C, stopping snapshot jobs");
    }

    Ok(())
}
