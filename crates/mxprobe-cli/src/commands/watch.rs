use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use mxprobe_core::{Poller, Probe, ProbeConfig, SessionTracker, ShutdownSignal};
use tracing::info;

/// Resolve the connection once, then print ping and client count at every
/// interval until Ctrl-C
pub fn run(config_path: &Path, interval_ms: u64) -> Result<()> {
    let config = ProbeConfig::load_or_create(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let probe = Arc::new(Probe::local(&config).context("Failed to open own process")?);

    let shutdown = Arc::new(ShutdownSignal::new());
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        shutdown_ctrlc.trigger();
    })?;

    let tracker = Arc::new(Mutex::new(SessionTracker::for_current_exe()));
    {
        let mut tracker = tracker.lock().map_err(|_| anyhow!("Session state poisoned"))?;
        let descriptor = tracker.on_race_session(&probe.decoders());
        println!("{} ({})", descriptor.role, descriptor.server_name);
    }

    let interval = Duration::from_millis(interval_ms);
    let poller = Poller::spawn(Arc::clone(&probe), Arc::clone(&tracker), interval)?;

    while !shutdown.wait(interval) {
        let tracker = tracker.lock().map_err(|_| anyhow!("Session state poisoned"))?;
        if tracker.role().is_online() {
            println!(
                "ping {:>8}  clients {:>7}",
                tracker.ping_label(),
                tracker.clients_label()
            );
        }
    }

    poller.stop();
    tracker
        .lock()
        .map_err(|_| anyhow!("Session state poisoned"))?
        .on_event_deinit();
    Ok(())
}
