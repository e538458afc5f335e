//! Stop flag shared by the CLI and background pollers.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Latching stop flag with an interruptible sleep.
///
/// A poisoned lock reads as stopped.
pub struct ShutdownSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        }
    }

    pub fn trigger(&self) {
        match self.stopped.lock() {
            Ok(mut stopped) => *stopped = true,
            Err(poisoned) => *poisoned.into_inner() = true,
        }
        self.wake.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.stopped.lock().map_or(true, |stopped| *stopped)
    }

    /// Sleep up to `timeout`; `true` if the signal fired
    pub fn wait(&self, timeout: Duration) -> bool {
        let Ok(stopped) = self.stopped.lock() else {
            return true;
        };
        match self
            .wake
            .wait_timeout_while(stopped, timeout, |stopped| !*stopped)
        {
            Ok((stopped, _)) => *stopped,
            Err(_) => true,
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
