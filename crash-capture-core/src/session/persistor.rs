use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::error::PersistError;
use crate::models::metadata::Metadata;
use crate::models::persist_result::PersistResult;
use crate::models::settings::Settings;
use crate::models::state::PersistState;
use crate::processing::concatenator;
use crate::processing::ring_buffer::SegmentRingBuffer;
use crate::storage;
use crate::traits::clock::{Clock, SystemClock};
use crate::traits::encryptor::ArtifactEncryptor;
use crate::traits::persist_delegate::PersistDelegate;
use crate::traits::storage_gateway::StorageGateway;

/// Background persist job orchestrator.
///
/// On a trigger, runs the end-to-end pipeline on a dedicated worker thread:
/// wait half the rolling window, announce the start, write metadata,
/// snapshot the ring buffer, concatenate, encrypt, and only then flush the
/// buffer and scratch data. Recording keeps appending to the shared buffer
/// throughout; only the final flush consumes footage.
///
/// At most one job is in flight; a trigger during an active job is rejected
/// with `PersistError::JobInFlight`. Failure at any stage aborts the
/// remaining stages and preserves buffered segments and scratch files.
pub struct Persistor {
    gateway: Arc<dyn StorageGateway>,
    buffer: Arc<Mutex<SegmentRingBuffer>>,
    encryptor: Arc<dyn ArtifactEncryptor>,
    clock: Arc<dyn Clock>,
    delegate: Option<Arc<dyn PersistDelegate>>,
    state: Arc<Mutex<PersistState>>,
    job_in_flight: Arc<AtomicBool>,
}

impl Persistor {
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        buffer: Arc<Mutex<SegmentRingBuffer>>,
        encryptor: Arc<dyn ArtifactEncryptor>,
    ) -> Self {
        Self {
            gateway,
            buffer,
            encryptor,
            clock: Arc::new(SystemClock),
            delegate: None,
            state: Arc::new(Mutex::new(PersistState::Idle)),
            job_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Substitute the time source, e.g. a deterministic fake in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn PersistDelegate>) {
        self.delegate = Some(delegate);
    }

    /// State of the most recent job.
    pub fn state(&self) -> PersistState {
        self.state.lock().clone()
    }

    pub fn is_job_in_flight(&self) -> bool {
        self.job_in_flight.load(Ordering::SeqCst)
    }

    /// Start the persist job for one trigger.
    ///
    /// Returns immediately with a handle to the background job; the terminal
    /// outcome is also delivered once through the delegate.
    pub fn start(&self, metadata: Metadata) -> Result<PersistHandle, PersistError> {
        if self
            .job_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PersistError::JobInFlight);
        }

        let settings = self.gateway.settings();
        if let Err(reason) = settings.validate() {
            self.job_in_flight.store(false, Ordering::SeqCst);
            return Err(PersistError::InvalidSettings(reason));
        }

        let ctx = JobContext {
            gateway: Arc::clone(&self.gateway),
            buffer: Arc::clone(&self.buffer),
            encryptor: Arc::clone(&self.encryptor),
            clock: Arc::clone(&self.clock),
            delegate: self.delegate.clone(),
            state: Arc::clone(&self.state),
        };
        let in_flight = Arc::clone(&self.job_in_flight);

        let handle = thread::Builder::new()
            .name("persist-job".into())
            .spawn(move || {
                let outcome = ctx.run(metadata, settings);
                match &outcome {
                    Ok(result) => {
                        log::info!("persist job for tag {} finished", result.tag);
                        ctx.set_state(PersistState::Done);
                    }
                    Err(e) => {
                        log::error!("persist job failed: {}", e);
                        ctx.set_state(PersistState::Failed(e.clone()));
                    }
                }
                if let Some(ref delegate) = ctx.delegate {
                    delegate.on_persisting_stopped(&outcome);
                }
                in_flight.store(false, Ordering::SeqCst);
                outcome
            })
            .map_err(|e| {
                self.job_in_flight.store(false, Ordering::SeqCst);
                PersistError::Io(format!("failed to spawn persist worker: {}", e))
            })?;

        Ok(PersistHandle { handle })
    }
}

/// Handle to a running persist job.
#[derive(Debug)]
pub struct PersistHandle {
    handle: thread::JoinHandle<Result<PersistResult, PersistError>>,
}

impl PersistHandle {
    /// Block until the job reaches a terminal state and return its outcome.
    pub fn join(self) -> Result<PersistResult, PersistError> {
        self.handle
            .join()
            .unwrap_or_else(|_| Err(PersistError::Io("persist worker panicked".into())))
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Everything one worker thread needs, cloned out of the `Persistor`.
struct JobContext {
    gateway: Arc<dyn StorageGateway>,
    buffer: Arc<Mutex<SegmentRingBuffer>>,
    encryptor: Arc<dyn ArtifactEncryptor>,
    clock: Arc<dyn Clock>,
    delegate: Option<Arc<dyn PersistDelegate>>,
    state: Arc<Mutex<PersistState>>,
}

impl JobContext {
    fn set_state(&self, next: PersistState) {
        *self.state.lock() = next.clone();
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&next);
        }
    }

    fn run(&self, metadata: Metadata, settings: Settings) -> Result<PersistResult, PersistError> {
        let tag = metadata.tag();
        log::info!("persist job started for tag {}", tag);
        self.set_state(PersistState::Triggered);

        // wait half the rolling window so post-trigger footage accumulates
        self.clock.wait(settings.persist_delay())?;

        // rendezvous: returns once the observer has applied the transition
        if let Some(ref delegate) = self.delegate {
            delegate.on_persisting_started();
        }
        log::info!("start writing files for tag {}", tag);

        // save metadata; this fixes the artifact tag for all later stages
        let readable_metadata = self.gateway.create_readable_metadata_file(&tag)?;
        storage::metadata::write_metadata(&metadata, &readable_metadata)?;
        self.set_state(PersistState::MetadataWritten);

        // snapshot, not flush: recording continues during the slower stages
        let snapshot = self.buffer.lock().snapshot();
        self.set_state(PersistState::SnapshotTaken);
        log::info!("snapshot of {} segments taken", snapshot.len());

        let temp_video = self.gateway.temp_video_file()?;
        let summary = concatenator::concatenate(&snapshot, &temp_video)?;
        self.set_state(PersistState::Concatenated);

        let encrypted_video = self.gateway.create_encrypted_video_file(&tag)?;
        let encrypted_metadata = self.gateway.create_encrypted_metadata_file(&tag)?;
        let wrapped_key = self.gateway.create_encrypted_key_file(&tag)?;
        self.encryptor.encrypt_all(
            &[temp_video, readable_metadata],
            &[encrypted_video.clone(), encrypted_metadata.clone()],
            &wrapped_key,
        )?;
        self.set_state(PersistState::Encrypted);

        let checksum = storage::sha256_file(&encrypted_video)?;

        // consumed footage and scratch data are released only once the whole
        // artifact set exists
        if let Err(e) = self.gateway.delete_temp_data() {
            log::warn!("failed to delete temp data: {}", e);
        }
        self.buffer.lock().flush_all();
        self.set_state(PersistState::Cleaned);

        Ok(PersistResult {
            tag,
            encrypted_video,
            encrypted_metadata,
            wrapped_key,
            duration_secs: summary.duration_ms as f64 / 1000.0,
            checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::mpsc;
    use std::time::Duration;

    use aes_gcm::aead::OsRng;
    use approx::assert_relative_eq;
    use x25519_dalek::{PublicKey, StaticSecret};

    use crate::models::metadata::TriggerType;
    use crate::models::segment::Segment;
    use crate::processing::clip_format::{self, ClipTrack, TrackHandler};
    use crate::storage::fs_gateway::DirStorageGateway;
    use crate::storage::hybrid_encryptor::{self, HybridEncryptor};

    /// Records requested waits without sleeping.
    #[derive(Default)]
    struct InstantClock {
        waits: Mutex<Vec<Duration>>,
    }

    impl Clock for InstantClock {
        fn wait(&self, duration: Duration) -> Result<(), PersistError> {
            self.waits.lock().push(duration);
            Ok(())
        }
    }

    /// Fails every wait, simulating an interrupted suspension point.
    struct InterruptedClock;

    impl Clock for InterruptedClock {
        fn wait(&self, _duration: Duration) -> Result<(), PersistError> {
            Err(PersistError::Interrupted)
        }
    }

    /// Parks the worker in its first wait until released.
    struct GateClock {
        release: Mutex<Option<mpsc::Receiver<()>>>,
    }

    impl Clock for GateClock {
        fn wait(&self, _duration: Duration) -> Result<(), PersistError> {
            if let Some(rx) = self.release.lock().take() {
                let _ = rx.recv();
            }
            Ok(())
        }
    }

    /// Captures the full observable event sequence of a job.
    #[derive(Default)]
    struct RecordingDelegate {
        events: Mutex<Vec<String>>,
    }

    impl RecordingDelegate {
        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl PersistDelegate for RecordingDelegate {
        fn on_persisting_started(&self) {
            self.events.lock().push("started".into());
        }

        fn on_state_changed(&self, state: &PersistState) {
            self.events.lock().push(format!("state:{:?}", state));
        }

        fn on_persisting_stopped(&self, outcome: &Result<PersistResult, PersistError>) {
            let label = match outcome {
                Ok(_) => "stopped:ok",
                Err(_) => "stopped:err",
            };
            self.events.lock().push(label.into());
        }
    }

    /// Always reports an encryption failure, touching nothing.
    struct FailingEncryptor;

    impl ArtifactEncryptor for FailingEncryptor {
        fn encrypt_all(
            &self,
            _inputs: &[PathBuf],
            _outputs: &[PathBuf],
            _key_dest: &Path,
        ) -> Result<(), PersistError> {
            Err(PersistError::Encryption("induced failure".into()))
        }

        fn algorithm(&self) -> &str {
            "FAILING"
        }
    }

    fn test_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("persistor_test_{}_{}", name, uuid::Uuid::new_v4()))
    }

    fn write_segment(dir: &Path, index: usize, duration_ms: u32) -> Segment {
        let tracks = vec![
            ClipTrack {
                handler: TrackHandler::Video,
                duration_ms,
                payload: vec![index as u8; 32],
            },
            ClipTrack {
                handler: TrackHandler::Audio,
                duration_ms,
                payload: vec![0xAA; 8],
            },
        ];
        let path = dir.join(format!("segment_{}.clip", index));
        fs::write(&path, clip_format::write_clip(&tracks)).unwrap();
        Segment::new(path)
    }

    fn filled_buffer(root: &Path, count: usize, capacity: usize) -> Arc<Mutex<SegmentRingBuffer>> {
        let segment_dir = root.join("segments");
        fs::create_dir_all(&segment_dir).unwrap();
        let buffer = Arc::new(Mutex::new(SegmentRingBuffer::new(capacity)));
        for i in 0..count {
            buffer.lock().append(write_segment(&segment_dir, i, 2000));
        }
        buffer
    }

    fn recipient_keypair() -> (StaticSecret, [u8; 32]) {
        let secret = StaticSecret::random_from_rng(&mut OsRng);
        let public = PublicKey::from(&secret).to_bytes();
        (secret, public)
    }

    #[test]
    fn end_to_end_persists_encrypted_artifacts() {
        let root = test_root("end_to_end");
        let settings = Settings { buffer_size_sec: 4 };
        let gateway = Arc::new(DirStorageGateway::new(&root, settings).unwrap());
        let buffer = filled_buffer(&root, 3, 3);
        let (secret, public) = recipient_keypair();
        let clock = Arc::new(InstantClock::default());
        let delegate = Arc::new(RecordingDelegate::default());

        let mut persistor = Persistor::new(
            gateway.clone(),
            buffer.clone(),
            Arc::new(HybridEncryptor::new(public)),
        )
        .with_clock(clock.clone());
        persistor.set_delegate(delegate.clone());

        let metadata = Metadata::with_date(123456789, TriggerType::None, [0.0, 0.0, 0.0]);
        let result = persistor.start(metadata).unwrap().join().unwrap();

        // half the rolling window was waited before acting
        assert_eq!(clock.waits.lock().as_slice(), &[Duration::from_secs(2)]);

        assert_eq!(result.tag, "123456789");
        assert!(result.encrypted_video.exists());
        assert!(result.encrypted_metadata.exists());
        assert!(result.wrapped_key.exists());
        assert_relative_eq!(result.duration_secs, 6.0, epsilon = 1e-9);
        assert!(!result.checksum.is_empty());

        // consumed footage and scratch data are gone
        assert!(buffer.lock().is_empty());
        assert_eq!(buffer.lock().capacity(), 3);
        assert_eq!(fs::read_dir(gateway.temp_dir()).unwrap().count(), 0);

        // decrypting with the matching private key reproduces the footage
        let file_key =
            hybrid_encryptor::unwrap_key(&fs::read(&result.wrapped_key).unwrap(), &secret).unwrap();
        let video = hybrid_encryptor::decrypt_file(&result.encrypted_video, &file_key).unwrap();
        let tracks = clip_format::parse_clip(&video).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].handler, TrackHandler::Video);
        assert_eq!(tracks[0].duration_ms, 6000);

        let meta_json = hybrid_encryptor::decrypt_file(&result.encrypted_metadata, &file_key).unwrap();
        let meta_json = String::from_utf8(meta_json).unwrap();
        assert!(meta_json.contains("123456789"));
        assert!(meta_json.contains("\"NONE\""));

        // observable order: started before any write, metadata before
        // concatenation, exactly one terminal callback
        let events = delegate.events();
        let position = |needle: &str| events.iter().position(|e| e == needle).unwrap();
        assert!(position("started") < position("state:MetadataWritten"));
        assert!(position("state:MetadataWritten") < position("state:Concatenated"));
        assert!(position("state:Concatenated") < position("state:Encrypted"));
        assert_eq!(events.iter().filter(|e| e.starts_with("stopped")).count(), 1);
        assert_eq!(events.last().unwrap(), "stopped:ok");

        assert_eq!(persistor.state(), PersistState::Done);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn encryption_failure_preserves_footage_and_scratch() {
        let root = test_root("enc_failure");
        let settings = Settings { buffer_size_sec: 4 };
        let gateway = Arc::new(DirStorageGateway::new(&root, settings).unwrap());
        let buffer = filled_buffer(&root, 3, 3);
        let delegate = Arc::new(RecordingDelegate::default());

        let mut persistor = Persistor::new(gateway.clone(), buffer.clone(), Arc::new(FailingEncryptor))
            .with_clock(Arc::new(InstantClock::default()));
        persistor.set_delegate(delegate.clone());

        let metadata = Metadata::with_date(123456789, TriggerType::Sensor, [0.0, 9.81, 0.0]);
        let err = persistor.start(metadata).unwrap().join().unwrap_err();
        assert_eq!(err, PersistError::Encryption("induced failure".into()));

        // nothing consumed: all three segments still buffered, scratch kept
        assert_eq!(buffer.lock().len(), 3);
        let temp_files: Vec<String> = fs::read_dir(gateway.temp_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(temp_files.iter().any(|n| n.starts_with("VIDEO_TMP_")));
        assert!(temp_files.iter().any(|n| n == "META_READABLE_123456789.json"));

        // the readable metadata still fixes the tag for diagnosis
        let meta = fs::read_to_string(gateway.temp_dir().join("META_READABLE_123456789.json")).unwrap();
        assert!(meta.contains("123456789"));
        assert!(meta.contains("\"SENSOR\""));

        let events = delegate.events();
        assert_eq!(events.iter().filter(|e| e.starts_with("stopped")).count(), 1);
        assert_eq!(events.last().unwrap(), "stopped:err");
        assert!(persistor.state().is_failed());

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn interrupted_wait_fails_before_any_write() {
        let root = test_root("interrupted");
        let settings = Settings { buffer_size_sec: 4 };
        let gateway = Arc::new(DirStorageGateway::new(&root, settings).unwrap());
        let buffer = filled_buffer(&root, 2, 3);
        let (_secret, public) = recipient_keypair();
        let delegate = Arc::new(RecordingDelegate::default());

        let mut persistor = Persistor::new(
            gateway.clone(),
            buffer.clone(),
            Arc::new(HybridEncryptor::new(public)),
        )
        .with_clock(Arc::new(InterruptedClock));
        persistor.set_delegate(delegate.clone());

        let err = persistor
            .start(Metadata::with_date(7, TriggerType::None, [0.0; 3]))
            .unwrap()
            .join()
            .unwrap_err();
        assert_eq!(err, PersistError::Interrupted);

        assert_eq!(buffer.lock().len(), 2);
        assert!(!delegate.events().iter().any(|e| e == "started"));
        assert_eq!(fs::read_dir(gateway.temp_dir()).unwrap().count(), 0);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn second_trigger_rejected_while_job_in_flight() {
        let root = test_root("in_flight");
        let settings = Settings { buffer_size_sec: 4 };
        let gateway = Arc::new(DirStorageGateway::new(&root, settings).unwrap());
        let buffer = Arc::new(Mutex::new(SegmentRingBuffer::new(3)));
        let (_secret, public) = recipient_keypair();

        let (tx, rx) = mpsc::channel();
        let persistor = Persistor::new(gateway, buffer, Arc::new(HybridEncryptor::new(public)))
            .with_clock(Arc::new(GateClock {
                release: Mutex::new(Some(rx)),
            }));

        let handle = persistor
            .start(Metadata::with_date(1, TriggerType::None, [0.0; 3]))
            .unwrap();
        assert!(persistor.is_job_in_flight());

        let err = persistor
            .start(Metadata::with_date(2, TriggerType::None, [0.0; 3]))
            .unwrap_err();
        assert_eq!(err, PersistError::JobInFlight);

        tx.send(()).unwrap();
        handle.join().unwrap();
        assert!(!persistor.is_job_in_flight());

        // a new trigger is accepted once the previous job is done
        let handle = persistor
            .start(Metadata::with_date(3, TriggerType::None, [0.0; 3]))
            .unwrap();
        handle.join().unwrap();

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn appends_continue_during_job() {
        let root = test_root("concurrent_append");
        let settings = Settings { buffer_size_sec: 4 };
        let gateway = Arc::new(DirStorageGateway::new(&root, settings).unwrap());
        let buffer = filled_buffer(&root, 2, 8);
        let (_secret, public) = recipient_keypair();

        let (tx, rx) = mpsc::channel();
        let persistor = Persistor::new(
            gateway,
            buffer.clone(),
            Arc::new(HybridEncryptor::new(public)),
        )
        .with_clock(Arc::new(GateClock {
            release: Mutex::new(Some(rx)),
        }));

        let handle = persistor
            .start(Metadata::with_date(5, TriggerType::None, [0.0; 3]))
            .unwrap();

        // the recording path keeps appending while the job is parked
        let segment_dir = root.join("segments");
        buffer.lock().append(write_segment(&segment_dir, 10, 2000));
        buffer.lock().append(write_segment(&segment_dir, 11, 2000));
        assert_eq!(buffer.lock().len(), 4);

        tx.send(()).unwrap();
        let result = handle.join().unwrap();

        // the job saw everything appended before its snapshot
        assert_relative_eq!(result.duration_secs, 8.0, epsilon = 1e-9);
        assert!(buffer.lock().is_empty());

        fs::remove_dir_all(&root).ok();
    }
}
