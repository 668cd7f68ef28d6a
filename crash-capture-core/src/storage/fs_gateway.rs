use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::models::error::PersistError;
use crate::models::settings::Settings;
use crate::traits::storage_gateway::StorageGateway;

/// Filesystem implementation of the storage gateway.
///
/// Owns the naming policy for all artifacts of a job and the scratch
/// directory for intermediate files:
/// ```text
/// <root>/VIDEO_<tag>.enc          encrypted footage
/// <root>/META_<tag>.enc           encrypted metadata
/// <root>/KEY_<tag>.enc            wrapped symmetric key
/// <root>/temp/META_READABLE_<tag>.json
/// <root>/temp/VIDEO_TMP_<uuid>.clip
/// <root>/temp/META_TMP_<uuid>.json
/// ```
/// Scratch names carry a uuid so a persist job's output can never collide
/// with a buffered segment file.
#[derive(Debug)]
pub struct DirStorageGateway {
    root: PathBuf,
    temp_dir: PathBuf,
    settings: Settings,
}

impl DirStorageGateway {
    pub fn new(root: impl Into<PathBuf>, settings: Settings) -> Result<Self, PersistError> {
        settings.validate().map_err(PersistError::InvalidSettings)?;

        let root = root.into();
        let temp_dir = root.join("temp");
        fs::create_dir_all(&temp_dir)
            .map_err(|e| PersistError::Io(format!("failed to create storage directories: {}", e)))?;

        Ok(Self {
            root,
            temp_dir,
            settings,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    fn create_file(&self, path: PathBuf) -> Result<PathBuf, PersistError> {
        File::create(&path)
            .map_err(|e| PersistError::Io(format!("failed to create {}: {}", path.display(), e)))?;
        Ok(path)
    }
}

impl StorageGateway for DirStorageGateway {
    fn create_readable_metadata_file(&self, tag: &str) -> Result<PathBuf, PersistError> {
        self.create_file(self.temp_dir.join(format!("META_READABLE_{}.json", tag)))
    }

    fn create_encrypted_metadata_file(&self, tag: &str) -> Result<PathBuf, PersistError> {
        self.create_file(self.root.join(format!("META_{}.enc", tag)))
    }

    fn create_encrypted_video_file(&self, tag: &str) -> Result<PathBuf, PersistError> {
        self.create_file(self.root.join(format!("VIDEO_{}.enc", tag)))
    }

    fn create_encrypted_key_file(&self, tag: &str) -> Result<PathBuf, PersistError> {
        self.create_file(self.root.join(format!("KEY_{}.enc", tag)))
    }

    fn temp_video_file(&self) -> Result<PathBuf, PersistError> {
        self.create_file(self.temp_dir.join(format!("VIDEO_TMP_{}.clip", uuid::Uuid::new_v4())))
    }

    fn temp_metadata_file(&self) -> Result<PathBuf, PersistError> {
        self.create_file(self.temp_dir.join(format!("META_TMP_{}.json", uuid::Uuid::new_v4())))
    }

    fn delete_temp_data(&self) -> Result<(), PersistError> {
        let entries = fs::read_dir(&self.temp_dir)
            .map_err(|e| PersistError::Io(format!("failed to list temp data: {}", e)))?;
        for entry in entries {
            let entry = entry.map_err(|e| PersistError::Io(format!("failed to list temp data: {}", e)))?;
            if let Err(e) = fs::remove_file(entry.path()) {
                log::warn!("failed to delete temp file {}: {}", entry.path().display(), e);
            }
        }
        Ok(())
    }

    fn settings(&self) -> Settings {
        self.settings
    }
}
