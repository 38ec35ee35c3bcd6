//! Root of the mixing graph with a playback cursor

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{SignalSource, WaveMix};
use crate::types::{Sample, StereoSample};

/// Cursor-addressable output stream over a mixed graph
///
/// The playback consumer repeatedly calls [`read`](Self::read); each call
/// renders the window at the cursor and advances it. Reading past the end of
/// every leaf yields silence, never an error.
pub struct MasterAdapter {
    source: Arc<WaveMix>,
    /// Cursor in stereo frames
    position: AtomicUsize,
}

impl MasterAdapter {
    /// Create an adapter positioned at frame 0
    pub fn new(source: WaveMix) -> Self {
        Self {
            source: Arc::new(source),
            position: AtomicUsize::new(0),
        }
    }

    /// Move the cursor to a frame offset
    pub fn set_position(&self, frame: usize) {
        self.position.store(frame, Ordering::Release);
    }

    /// Current cursor frame offset
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    /// Whether the next `count` frames are fully rendered
    pub fn is_ready(&self, count: usize) -> bool {
        self.source.is_ready(self.position(), count)
    }

    /// Last frame any leaf can produce
    pub fn end_frame(&self) -> usize {
        self.source.end_frame()
    }

    /// Fill `out` with the frames at the cursor and advance it
    ///
    /// Returns the number of frames written (always `out.len()`).
    pub fn read(&self, out: &mut [StereoSample]) -> usize {
        out.fill(StereoSample::silence());
        let position = self.position.fetch_add(out.len(), Ordering::AcqRel);
        self.source.mix(position, out);
        out.len()
    }

    /// Fill an interleaved `[L, R, L, R, ...]` device buffer
    ///
    /// A trailing odd sample is zeroed. Returns the number of samples written.
    pub fn read_interleaved(&self, out: &mut [Sample]) -> usize {
        let even = out.len() & !1;
        let (frames, rest) = out.split_at_mut(even);
        rest.fill(0.0);
        let frames: &mut [StereoSample] = bytemuck::cast_slice_mut(frames);
        self.read(frames) * 2
    }
}
