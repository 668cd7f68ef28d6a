/// Clip container utilities.
///
/// The recorder writes each segment as a small chunked container with typed
/// tracks. All multi-byte integers are little-endian.
///
/// Layout:
/// ```text
/// [0-3]    "CLIP"
/// [4-5]    format version (currently 1)
/// [6-7]    track count
/// then per track:
/// [0-3]    handler fourcc ("vide" = video, "soun" = audio)
/// [4-7]    duration in milliseconds
/// [8-11]   payload length in bytes
/// [12..]   payload
/// ```
/// Size of the fixed clip header in bytes.
pub const CLIP_HEADER_SIZE: usize = 8;

/// Size of a per-track header in bytes.
pub const TRACK_HEADER_SIZE: usize = 12;

pub const CLIP_MAGIC: &[u8; 4] = b"CLIP";
pub const CLIP_VERSION: u16 = 1;

pub const HANDLER_VIDEO: &[u8; 4] = b"vide";
pub const HANDLER_AUDIO: &[u8; 4] = b"soun";

/// Track handler, identifying the media type of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackHandler {
    Video,
    Audio,
    /// Any handler this crate does not interpret. Preserved as-is.
    Other([u8; 4]),
}

impl TrackHandler {
    pub fn from_fourcc(fourcc: [u8; 4]) -> Self {
        match &fourcc {
            HANDLER_VIDEO => Self::Video,
            HANDLER_AUDIO => Self::Audio,
            _ => Self::Other(fourcc),
        }
    }

    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            Self::Video => *HANDLER_VIDEO,
            Self::Audio => *HANDLER_AUDIO,
            Self::Other(fourcc) => *fourcc,
        }
    }

    /// Whether this is a primary-media track. Everything that is not video
    /// is auxiliary and discarded by concatenation.
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Video)
    }
}

/// One track of a clip container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipTrack {
    pub handler: TrackHandler,
    pub duration_ms: u32,
    pub payload: Vec<u8>,
}

/// Parse a clip container into its tracks.
///
/// Strict: truncation, a bad magic/version, or trailing bytes all reject the
/// whole clip with a reason string.
pub fn parse_clip(bytes: &[u8]) -> Result<Vec<ClipTrack>, String> {
    if bytes.len() < CLIP_HEADER_SIZE {
        return Err("truncated clip header".into());
    }
    if &bytes[0..4] != CLIP_MAGIC {
        return Err("bad clip magic".into());
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != CLIP_VERSION {
        return Err(format!("unsupported clip version {}", version));
    }
    let track_count = u16::from_le_bytes([bytes[6], bytes[7]]);

    let mut tracks = Vec::with_capacity(track_count as usize);
    let mut offset = CLIP_HEADER_SIZE;
    for _ in 0..track_count {
        if bytes.len() < offset + TRACK_HEADER_SIZE {
            return Err("truncated track header".into());
        }
        let mut fourcc = [0u8; 4];
        fourcc.copy_from_slice(&bytes[offset..offset + 4]);
        let duration_ms = u32::from_le_bytes([
            bytes[offset + 4],
            bytes[offset + 5],
            bytes[offset + 6],
            bytes[offset + 7],
        ]);
        let payload_len = u32::from_le_bytes([
            bytes[offset + 8],
            bytes[offset + 9],
            bytes[offset + 10],
            bytes[offset + 11],
        ]) as usize;
        offset += TRACK_HEADER_SIZE;

        if bytes.len() < offset + payload_len {
            return Err("truncated track payload".into());
        }
        tracks.push(ClipTrack {
            handler: TrackHandler::from_fourcc(fourcc),
            duration_ms,
            payload: bytes[offset..offset + payload_len].to_vec(),
        });
        offset += payload_len;
    }

    if offset != bytes.len() {
        return Err("trailing bytes after last track".into());
    }
    Ok(tracks)
}

/// Serialize tracks into a clip container.
pub fn write_clip(tracks: &[ClipTrack]) -> Vec<u8> {
    let payload_total: usize = tracks.iter().map(|t| t.payload.len()).sum();
    let mut out = Vec::with_capacity(CLIP_HEADER_SIZE + tracks.len() * TRACK_HEADER_SIZE + payload_total);

    out.extend_from_slice(CLIP_MAGIC);
    out.extend_from_slice(&CLIP_VERSION.to_le_bytes());
    out.extend_from_slice(&(tracks.len() as u16).to_le_bytes());

    for track in tracks {
        out.extend_from_slice(&track.handler.fourcc());
        out.extend_from_slice(&track.duration_ms.to_le_bytes());
        out.extend_from_slice(&(track.payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&track.payload);
    }
    out
}
