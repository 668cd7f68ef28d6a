use super::error::PersistError;

/// Persist job state machine.
///
/// State transitions:
/// ```text
/// idle → triggered → metadata_written → snapshot_taken → concatenated
///                                                             ↓
///                         done ← cleaned ← encrypted ←────────┘
/// ```
/// `Failed` absorbs from any non-terminal state. Exactly one job may occupy
/// a non-idle state at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistState {
    Idle,
    Triggered,
    MetadataWritten,
    SnapshotTaken,
    Concatenated,
    Encrypted,
    Cleaned,
    Done,
    Failed(PersistError),
}

impl PersistState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
