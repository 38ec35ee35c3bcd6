//! Common types for Cantus
//!
//! Fundamental audio types shared by the mixing graph and the render
//! orchestrator: the stereo frame type, the output sample rate and the
//! time/gain conversions used when placing rendered phrases on the timeline.

/// Output sample rate of the mixing graph (Hz)
///
/// Renderers deliver mono buffers at this rate and the master adapter emits
/// stereo frames at this rate.
pub const SAMPLE_RATE: u32 = 44100;

/// Volume at or below which a fader is fully silent (dB)
pub const SILENCE_FLOOR_DB: f32 = -24.0;

/// Audio sample type
pub type Sample = f32;

/// A single stereo frame (left and right channels)
///
/// `#[repr(C)]` keeps the layout `[left, right]` so a `&mut [f32]` interleaved
/// device buffer can be viewed as `&mut [StereoSample]` without copying.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    /// Create a new stereo sample
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    /// Create a silent stereo sample
    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Create a mono sample (same value in both channels)
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }

    /// Get the peak amplitude (max of abs(left), abs(right))
    #[inline]
    pub fn peak(&self) -> Sample {
        self.left.abs().max(self.right.abs())
    }
}

impl std::ops::Add for StereoSample {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            left: self.left + other.left,
            right: self.right + other.right,
        }
    }
}

impl std::ops::AddAssign for StereoSample {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.left += other.left;
        self.right += other.right;
    }
}

impl std::ops::Mul<Sample> for StereoSample {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Sample) -> Self {
        Self {
            left: self.left * factor,
            right: self.right * factor,
        }
    }
}

/// Convert a timeline position in milliseconds to a frame offset
///
/// Negative positions (a consonant lead-in before tick 0) clamp to frame 0.
#[inline]
pub fn ms_to_frames(ms: f64) -> usize {
    if ms <= 0.0 {
        return 0;
    }
    (ms * SAMPLE_RATE as f64 / 1000.0).round() as usize
}

/// Convert a frame count to milliseconds
#[inline]
pub fn frames_to_ms(frames: usize) -> f64 {
    frames as f64 * 1000.0 / SAMPLE_RATE as f64
}

/// Convert a track volume in decibels to a linear fader scale
///
/// Anything at or below [`SILENCE_FLOOR_DB`] maps to 0.0 so that a muted
/// track (faded to the floor) is fully silent rather than merely quiet.
pub fn decibel_to_volume(db: f32) -> f32 {
    if db <= SILENCE_FLOOR_DB {
        0.0
    } else {
        10.0_f32.powf(db / 20.0)
    }
}
