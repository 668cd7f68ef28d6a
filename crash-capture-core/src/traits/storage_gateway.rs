use std::path::PathBuf;

use crate::models::error::PersistError;
use crate::models::settings::Settings;

/// Storage collaborator surface consumed by the persist pipeline.
///
/// Each `create_*` call returns a writable destination path; naming policy
/// is the gateway's responsibility. The shipped filesystem implementation is
/// `DirStorageGateway`.
pub trait StorageGateway: Send + Sync {
    /// Destination for the plaintext canonical metadata record. Lives in
    /// scratch space: removed by `delete_temp_data`, preserved when a failed
    /// job skips cleanup.
    fn create_readable_metadata_file(&self, tag: &str) -> Result<PathBuf, PersistError>;

    /// Destination for the encrypted metadata artifact.
    fn create_encrypted_metadata_file(&self, tag: &str) -> Result<PathBuf, PersistError>;

    /// Destination for the encrypted video artifact.
    fn create_encrypted_video_file(&self, tag: &str) -> Result<PathBuf, PersistError>;

    /// Destination for the wrapped symmetric key artifact.
    fn create_encrypted_key_file(&self, tag: &str) -> Result<PathBuf, PersistError>;

    /// Scratch destination for the concatenated clip. Collision-free with
    /// every buffered segment name.
    fn temp_video_file(&self) -> Result<PathBuf, PersistError>;

    /// Scratch destination for intermediate metadata.
    fn temp_metadata_file(&self) -> Result<PathBuf, PersistError>;

    /// Delete all scratch data. Called only after a job succeeded.
    fn delete_temp_data(&self) -> Result<(), PersistError>;

    /// The configured recording settings.
    fn settings(&self) -> Settings;
}
