use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Recording settings shared between the recorder and the persist pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Length of the rolling window in seconds. Drives the recorder's ring
    /// buffer sizing and the pre-persist wait (`buffer_size_sec / 2`).
    pub buffer_size_sec: u32,
}

impl Settings {
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_size_sec == 0 {
            return Err("buffer size must be positive".into());
        }
        Ok(())
    }

    /// How long a persist job waits before acting, so the persisted window
    /// straddles the trigger instant instead of ending at it.
    pub fn persist_delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.buffer_size_sec / 2))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self { buffer_size_sec: 10 }
    }
}
