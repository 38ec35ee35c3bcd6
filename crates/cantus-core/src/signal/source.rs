//! Leaf node holding one buffer of samples at a fixed timeline offset

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use super::SignalSource;
use crate::types::{ms_to_frames, Sample, StereoSample};

/// A finite sample buffer placed on the timeline
///
/// Created as a placeholder sized to the renderer's estimate, then filled
/// exactly once by [`set_samples`](Self::set_samples). The payload is swapped
/// in as a whole `Arc`, so a concurrent reader sees either no samples
/// (silence) or the complete buffer, never a partial write.
pub struct WaveSource {
    /// Timeline frame of the first audible sample
    offset: usize,
    /// Placeholder length used until samples arrive
    estimated_length: usize,
    /// Frames dropped from the start of the payload
    skip: usize,
    /// Interleaved channel count of the payload
    stride: usize,
    samples: ArcSwapOption<Vec<Sample>>,
}

impl WaveSource {
    /// Create an empty source
    ///
    /// # Arguments
    /// * `offset_ms` - Timeline position of the first audible sample
    /// * `estimated_length_ms` - Expected duration until real samples arrive
    /// * `skip_ms` - Leading payload duration to skip over
    /// * `channels` - Payload channel count; mono is duplicated to both sides,
    ///   wider payloads play their first two channels
    ///
    /// A negative offset (lead-in before the timeline origin) is folded into
    /// the skip so the audible part stays aligned.
    pub fn new(offset_ms: f64, estimated_length_ms: f64, skip_ms: f64, channels: u16) -> Self {
        let before_origin = (-offset_ms).max(0.0);
        Self {
            offset: ms_to_frames(offset_ms),
            estimated_length: ms_to_frames(estimated_length_ms - before_origin),
            skip: ms_to_frames(skip_ms + before_origin),
            stride: usize::from(channels.max(1)),
            samples: ArcSwapOption::empty(),
        }
    }

    /// Publish the rendered samples
    pub fn set_samples(&self, samples: Vec<Sample>) {
        self.set_shared_samples(Arc::new(samples));
    }

    /// Publish an already shared buffer (pre-decoded wave parts)
    pub fn set_shared_samples(&self, samples: Arc<Vec<Sample>>) {
        if self.samples.swap(Some(samples)).is_some() {
            log::warn!("[SIGNAL] WaveSource at frame {} filled twice", self.offset);
        }
    }

    /// Whether samples have been published
    pub fn has_samples(&self) -> bool {
        self.samples.load().is_some()
    }

    /// Timeline frame of the first audible sample
    pub fn offset_frame(&self) -> usize {
        self.offset
    }

    /// Audible frames in the payload (after skipping), if filled
    fn payload_frames(&self, samples: &[Sample]) -> usize {
        (samples.len() / self.stride).saturating_sub(self.skip)
    }
}

impl SignalSource for WaveSource {
    fn is_ready(&self, position: usize, count: usize) -> bool {
        if self.has_samples() {
            return true;
        }
        let end = self.offset + self.estimated_length;
        position + count <= self.offset || position >= end
    }

    fn mix(&self, position: usize, buffer: &mut [StereoSample]) {
        let guard = self.samples.load();
        let Some(samples) = guard.as_deref() else {
            return;
        };

        let start = position.max(self.offset);
        let end = (position + buffer.len()).min(self.offset + self.payload_frames(samples));
        for frame in start..end {
            let src = (frame - self.offset + self.skip) * self.stride;
            let value = if self.stride == 1 {
                StereoSample::mono(samples[src])
            } else {
                StereoSample::new(samples[src], samples[src + 1])
            };
            buffer[frame - position] += value;
        }
    }

    fn end_frame(&self) -> usize {
        match self.samples.load().as_deref() {
            Some(samples) => self.offset + self.payload_frames(samples),
            None => self.offset + self.estimated_length,
        }
    }
}
