//! # crash-capture-core
//!
//! Platform-agnostic crash footage persistence core library.
//!
//! A recorder (platform-specific, external to this crate) continuously
//! appends short clip segments to a bounded rolling buffer. When a trigger
//! fires, a background persist job waits out half the rolling window,
//! snapshots the buffer, concatenates the footage into one continuous clip,
//! encrypts it together with the trigger metadata under a hybrid scheme,
//! and only then releases the consumed segments. Recording never stops
//! while persistence runs, and a failed job never destroys unrecovered
//! footage.
//!
//! ## Architecture
//!
//! ```text
//! crash-capture-core (this crate)
//! ├── traits/       ← StorageGateway, ArtifactEncryptor, PersistDelegate, Clock
//! ├── models/       ← PersistError, PersistState, Metadata, Segment, Settings
//! ├── processing/   ← SegmentRingBuffer, clip container format, concatenation
//! ├── session/      ← Persistor (background job orchestrator)
//! └── storage/      ← DirStorageGateway, HybridEncryptor, metadata I/O
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::error::PersistError;
pub use models::metadata::{Metadata, TriggerType};
pub use models::persist_result::PersistResult;
pub use models::segment::Segment;
pub use models::settings::Settings;
pub use models::state::PersistState;
pub use processing::concatenator::{concatenate, ConcatSummary};
pub use processing::ring_buffer::SegmentRingBuffer;
pub use session::persistor::{PersistHandle, Persistor};
pub use storage::fs_gateway::DirStorageGateway;
pub use storage::hybrid_encryptor::HybridEncryptor;
pub use traits::clock::{Clock, SystemClock};
pub use traits::encryptor::ArtifactEncryptor;
pub use traits::persist_delegate::PersistDelegate;
pub use traits::storage_gateway::StorageGateway;
