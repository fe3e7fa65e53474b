//! Phase timing.

use std::time::{Duration, Instant};

use tracing::info;

/// A simple timer for measuring how long a phase took.
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Start a new timer with the given phase name.
    pub fn start(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Finish the timer and log the elapsed time.
    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        info!(phase = %self.name, elapsed_ms = elapsed.as_millis() as u64, "done");
        elapsed
    }
}
