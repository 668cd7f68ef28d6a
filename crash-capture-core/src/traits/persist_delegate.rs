use crate::models::error::PersistError;
use crate::models::persist_result::PersistResult;
use crate::models::state::PersistState;

/// Event delegate for persist job notifications.
///
/// All methods are called from the persist worker thread, not the UI thread.
/// Implementations should marshal to the UI thread if needed.
pub trait PersistDelegate: Send + Sync {
    /// Called once after the pre-persist wait, before any file is written.
    ///
    /// The job blocks until this returns: the return is the acknowledgement
    /// that whichever component owns externally observable state has applied
    /// the "persisting" transition.
    fn on_persisting_started(&self);

    /// Called on every state transition of the job.
    fn on_state_changed(&self, state: &PersistState);

    /// Called exactly once per job with the terminal outcome.
    fn on_persisting_stopped(&self, outcome: &Result<PersistResult, PersistError>);
}
