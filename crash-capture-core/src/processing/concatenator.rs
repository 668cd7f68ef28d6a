use std::fs;
use std::path::Path;

use crate::models::error::PersistError;
use crate::models::segment::Segment;
use crate::processing::clip_format::{self, ClipTrack, TrackHandler};

/// Summary of one concatenation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcatSummary {
    /// Number of input segments consumed.
    pub segment_count: usize,
    /// Total duration of the merged primary track.
    pub duration_ms: u64,
    /// Size of the written output container.
    pub bytes: u64,
}

/// Merge an ordered sequence of segments into one continuous clip at `dest`.
///
/// For each segment the container is parsed and only primary (`vide`) tracks
/// are kept; auxiliary tracks are discarded regardless of input order. The
/// selected track payloads are appended in input order into a single output
/// track whose duration is the sum of the inputs, written in the same
/// container format.
///
/// If any input cannot be read or parsed the whole operation aborts;
/// partial footage must not pass as success. An empty input sequence yields
/// a valid zero-track clip.
pub fn concatenate(segments: &[Segment], dest: &Path) -> Result<ConcatSummary, PersistError> {
    let mut merged: Vec<u8> = Vec::new();
    let mut duration_ms: u64 = 0;
    let mut saw_primary = false;

    for segment in segments {
        let bytes = fs::read(segment.path()).map_err(|e| {
            PersistError::Io(format!(
                "failed to read segment {}: {}",
                segment.path().display(),
                e
            ))
        })?;
        let tracks = parse_segment(segment, &bytes)?;
        for track in tracks.into_iter().filter(|t| t.handler.is_primary()) {
            saw_primary = true;
            duration_ms += u64::from(track.duration_ms);
            merged.extend_from_slice(&track.payload);
        }
    }

    let output = if saw_primary {
        vec![ClipTrack {
            handler: TrackHandler::Video,
            duration_ms: u32::try_from(duration_ms).unwrap_or(u32::MAX),
            payload: merged,
        }]
    } else {
        Vec::new()
    };
    let bytes = clip_format::write_clip(&output);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| PersistError::Io(format!("failed to create directory: {}", e)))?;
    }
    fs::write(dest, &bytes).map_err(|e| {
        PersistError::Io(format!("failed to write concatenated clip {}: {}", dest.display(), e))
    })?;

    log::info!(
        "concatenated {} segments into {} ({} ms)",
        segments.len(),
        dest.display(),
        duration_ms
    );

    Ok(ConcatSummary {
        segment_count: segments.len(),
        duration_ms,
        bytes: bytes.len() as u64,
    })
}

fn parse_segment(segment: &Segment, bytes: &[u8]) -> Result<Vec<ClipTrack>, PersistError> {
    clip_format::parse_clip(bytes).map_err(|reason| PersistError::CorruptSegment {
        path: segment.path().display().to_string(),
        reason,
    })
}
