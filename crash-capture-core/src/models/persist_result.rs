use std::path::PathBuf;

/// Description of the artifact set produced by one successful persist job.
///
/// All three files are named with the trigger tag and are only valid
/// together; a failed job reports a `PersistError` instead and produces no
/// valid artifacts.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistResult {
    /// Artifact-naming key, taken from the trigger metadata.
    pub tag: String,
    /// Ciphertext of the concatenated footage.
    pub encrypted_video: PathBuf,
    /// Ciphertext of the canonical metadata record.
    pub encrypted_metadata: PathBuf,
    /// The job's symmetric key, wrapped under the recipient public key.
    pub wrapped_key: PathBuf,
    /// Total primary-track duration of the persisted footage.
    pub duration_secs: f64,
    /// SHA-256 hex digest of the encrypted video file.
    pub checksum: String,
}
