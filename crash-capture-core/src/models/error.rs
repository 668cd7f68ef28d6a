use thiserror::Error;

/// Errors that can occur while persisting a triggered recording.
///
/// Every job failure collapses to exactly one of these variants and is
/// delivered once through the completion callback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// Read/write failure on any file involved in the job. Buffered and
    /// temporary data are preserved.
    #[error("i/o failure: {0}")]
    Io(String),

    /// A buffered segment could not be parsed during concatenation.
    /// The whole job aborts; partial footage never passes as success.
    #[error("corrupt segment {path}: {reason}")]
    CorruptSegment { path: String, reason: String },

    /// Key generation, symmetric cipher, or key-wrap failure. Temporary
    /// plaintext files are left in place for inspection.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// One of the job's suspension points was interrupted.
    #[error("persist wait interrupted")]
    Interrupted,

    /// A trigger arrived while another persist job was still running.
    #[error("a persist job is already in flight")]
    JobInFlight,

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}
