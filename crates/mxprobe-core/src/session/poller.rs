use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::SessionTracker;
use crate::error::Result;
use crate::memory::ReadMemory;
use crate::probe::Probe;
use crate::shutdown::ShutdownSignal;

/// Background thread refreshing a `SessionTracker` at a fixed interval.
///
/// Stops on `stop` or drop; a pending wait is interrupted rather than
/// slept out.
pub struct Poller {
    shutdown: Arc<ShutdownSignal>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn spawn<M>(
        probe: Arc<Probe<M>>,
        tracker: Arc<Mutex<SessionTracker>>,
        interval: Duration,
    ) -> Result<Self>
    where
        M: ReadMemory + Send + Sync + 'static,
    {
        let shutdown = Arc::new(ShutdownSignal::new());
        let signal = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("mxprobe-poller".to_string())
            .spawn(move || {
                info!(
                    "Periodic task thread started with interval: {} ms",
                    interval.as_millis()
                );
                loop {
                    match tracker.lock() {
                        Ok(mut tracker) => tracker.refresh(&probe.decoders()),
                        Err(_) => {
                            warn!("Session state poisoned, stopping poller");
                            break;
                        }
                    }
                    if signal.wait(interval) {
                        break;
                    }
                }
                debug!("Periodic task thread stopped");
            })?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the thread and wait for it to exit
    pub fn stop(mut self) {
        self.join();
    }

    fn join(&mut self) {
        self.shutdown.trigger();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Periodic task thread panicked");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.join();
    }
}
