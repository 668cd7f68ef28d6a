use std::collections::VecDeque;
use std::fs;

use crate::models::segment::Segment;

/// Bounded, ordered store of recorded segment handles.
///
/// Wrap in `Arc<parking_lot::Mutex<SegmentRingBuffer>>` for cross-thread
/// access: the recorder appends continuously while a persist job snapshots
/// and, on success, flushes. The lock is only held for the instant of each
/// call, so appends are never blocked for the duration of a job.
///
/// Overflow behavior: evicts the oldest segment and deletes its backing file.
#[derive(Debug)]
pub struct SegmentRingBuffer {
    segments: VecDeque<Segment>,
    capacity: usize,
}

impl SegmentRingBuffer {
    /// `capacity` must be positive.
    pub fn new(capacity: usize) -> Self {
        Self {
            segments: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert a segment at the newest position.
    ///
    /// If the buffer is full, the oldest segment is evicted first and its
    /// backing file deleted. A deletion failure is logged, not propagated;
    /// the buffer stays usable.
    pub fn append(&mut self, segment: Segment) {
        if self.capacity > 0 && self.segments.len() == self.capacity {
            if let Some(oldest) = self.segments.pop_front() {
                if let Err(e) = fs::remove_file(oldest.path()) {
                    log::warn!(
                        "failed to delete evicted segment {}: {}",
                        oldest.path().display(),
                        e
                    );
                }
            }
        }
        self.segments.push_back(segment);
    }

    /// Consistent, order-preserving copy of the current contents.
    ///
    /// Does not remove anything; only `flush_all` empties the buffer.
    pub fn snapshot(&self) -> Vec<Segment> {
        self.segments.iter().cloned().collect()
    }

    /// Delete every held segment's backing file and empty the buffer.
    ///
    /// Used only after a persist job has consumed a snapshot successfully.
    pub fn flush_all(&mut self) {
        for segment in self.segments.drain(..) {
            if let Err(e) = fs::remove_file(segment.path()) {
                log::warn!(
                    "failed to delete flushed segment {}: {}",
                    segment.path().display(),
                    e
                );
            }
        }
    }

    /// The configured capacity N.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of segments currently held.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
