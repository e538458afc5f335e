//! CLI command implementations.

pub mod check;
pub mod config;
pub mod hex_utils;
pub mod hexdump;
pub mod regions;
pub mod scan;
pub mod sockaddr;
pub mod status;
pub mod watch;

use std::path::Path;

use anyhow::{Context, Result};
use mxprobe_core::{LocalProcess, Probe, ProbeConfig};
use tracing::debug;

/// Load the config, falling back to defaults when the file does not exist
pub fn load_config(path: &Path) -> Result<ProbeConfig> {
    match ProbeConfig::load(path) {
        Ok(config) => Ok(config),
        Err(e) if e.is_not_found() => {
            debug!("{} not found, using built-in defaults", path.display());
            Ok(ProbeConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load {}", path.display())),
    }
}

/// Engine over this process
pub fn open_probe(config_path: &Path) -> Result<Probe<LocalProcess>> {
    let config = load_config(config_path)?;
    Probe::local(&config).context("Failed to open own process")
}
