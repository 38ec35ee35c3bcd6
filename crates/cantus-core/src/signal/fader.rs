//! Per-track gain stage

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use super::SignalSource;
use crate::types::{ms_to_frames, Sample, StereoSample};

/// Ramp length used by [`Fader::new`]
const DEFAULT_RAMP_MS: f64 = 10.0;

/// Applies a gain scalar to an upstream source
///
/// The scale can be changed live from the UI thread while playback reads.
/// Changes ramp linearly from the current scale to the target so volume moves
/// don't click; [`set_scale_to_target`](Self::set_scale_to_target) skips the
/// ramp (used when a graph is first built).
pub struct Fader {
    source: Arc<dyn SignalSource>,
    /// Target scale (f32 bits)
    target: AtomicU32,
    /// Scale applied to the most recent frame (f32 bits)
    current: AtomicU32,
    /// Maximum scale change per frame
    ramp_step: Sample,
    /// Upstream output, reused across reads; grows to the largest block seen
    scratch: Mutex<Vec<StereoSample>>,
}

impl Fader {
    /// Create a unity-gain fader with the default ramp
    pub fn new(source: Arc<dyn SignalSource>) -> Self {
        Self::with_ramp_ms(source, DEFAULT_RAMP_MS)
    }

    /// Create a unity-gain fader that ramps full scale over `ramp_ms`
    pub fn with_ramp_ms(source: Arc<dyn SignalSource>, ramp_ms: f64) -> Self {
        let ramp_frames = ms_to_frames(ramp_ms).max(1);
        Self {
            source,
            target: AtomicU32::new(1.0_f32.to_bits()),
            current: AtomicU32::new(1.0_f32.to_bits()),
            ramp_step: 1.0 / ramp_frames as Sample,
            scratch: Mutex::new(Vec::new()),
        }
    }

    /// Target scale
    pub fn scale(&self) -> Sample {
        Sample::from_bits(self.target.load(Ordering::Acquire))
    }

    /// Set the target scale; playback ramps towards it
    pub fn set_scale(&self, scale: Sample) {
        self.target.store(scale.max(0.0).to_bits(), Ordering::Release);
    }

    /// Scale currently applied to output
    pub fn current_scale(&self) -> Sample {
        Sample::from_bits(self.current.load(Ordering::Acquire))
    }

    /// Jump the applied scale to the target without ramping
    pub fn set_scale_to_target(&self) {
        self.current
            .store(self.target.load(Ordering::Acquire), Ordering::Release);
    }
}

impl SignalSource for Fader {
    fn is_ready(&self, position: usize, count: usize) -> bool {
        self.source.is_ready(position, count)
    }

    fn mix(&self, position: usize, buffer: &mut [StereoSample]) {
        let mut scratch = self.scratch.lock().unwrap_or_else(|e| e.into_inner());
        scratch.clear();
        scratch.resize(buffer.len(), StereoSample::silence());
        self.source.mix(position, &mut scratch);

        let target = self.scale();
        let mut current = self.current_scale();
        for (dst, src) in buffer.iter_mut().zip(scratch.iter()) {
            if current < target {
                current = (current + self.ramp_step).min(target);
            } else if current > target {
                current = (current - self.ramp_step).max(target);
            }
            *dst += *src * current;
        }
        self.current.store(current.to_bits(), Ordering::Release);
    }

    fn end_frame(&self) -> usize {
        self.source.end_frame()
    }
}
