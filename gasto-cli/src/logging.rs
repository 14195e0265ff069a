use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::state::logs_dir;

/// Filter directive override, e.g. `GASTO_LOG=gasto_api=debug`
pub const LOG_ENV: &str = "GASTO_LOG";

/// Logs go to `~/.gasto/logs/gasto.log` so they never draw over the terminal UI.
pub fn init() -> Result<()> {
    let path = logs_dir()?.join("gasto.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("init logging: {e}"))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gasto starting");
    Ok(())
}
