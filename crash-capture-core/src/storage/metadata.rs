use std::fs;
use std::path::Path;

use crate::models::error::PersistError;
use crate::models::metadata::Metadata;

/// Write a trigger metadata record in its canonical JSON form.
pub fn write_metadata(metadata: &Metadata, path: &Path) -> Result<(), PersistError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| PersistError::Io(format!("failed to serialize metadata: {}", e)))?;
    fs::write(path, json)
        .map_err(|e| PersistError::Io(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read a trigger metadata record back from its canonical JSON form.
pub fn read_metadata(path: &Path) -> Result<Metadata, PersistError> {
    let json = fs::read_to_string(path)
        .map_err(|e| PersistError::Io(format!("failed to read metadata: {}", e)))?;
    let metadata: Metadata = serde_json::from_str(&json)
        .map_err(|e| PersistError::Io(format!("failed to parse metadata: {}", e)))?;
    Ok(metadata)
}
