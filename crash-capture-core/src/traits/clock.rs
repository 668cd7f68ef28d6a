use std::thread;
use std::time::Duration;

use crate::models::error::PersistError;

/// Injectable time source for the persist job's deliberate waits.
///
/// Production uses [`SystemClock`]; tests substitute a deterministic fake so
/// elapsed time is simulated instead of slept.
pub trait Clock: Send + Sync {
    /// Block the calling thread for `duration`.
    ///
    /// Returns `PersistError::Interrupted` if the wait was cut short; the
    /// job treats that as failure.
    fn wait(&self, duration: Duration) -> Result<(), PersistError>;
}

/// Real wall-clock waits via `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn wait(&self, duration: Duration) -> Result<(), PersistError> {
        thread::sleep(duration);
        Ok(())
    }
}
