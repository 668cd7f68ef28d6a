use std::path::{Path, PathBuf};

/// Handle to one immutable recorded clip file held in the rolling buffer.
///
/// Created by the recorder, never mutated. The ring buffer owns the backing
/// storage: the file is deleted on eviction or flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    path: PathBuf,
}

impl Segment {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing storage location of this segment.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
