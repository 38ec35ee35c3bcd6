//! Mixing graph - sources, mixes, faders and the master adapter
//!
//! A render pass builds one graph up front and hands it to playback before
//! any phrase has been synthesised:
//!
//! ```text
//! WaveSource ─┐
//! WaveSource ─┼─► WaveMix ─► Fader ─┐
//! WaveSource ─┘                     ├─► WaveMix ─► MasterAdapter ─► playback
//!              ... ─► WaveMix ─► Fader ─┘
//! ```
//!
//! The graph shape never changes after construction. The one mutable part is
//! the sample payload of each [`WaveSource`] leaf, which the render thread
//! publishes atomically once the phrase is ready. Until then the leaf reads
//! as silence.

mod fader;
mod master;
mod mix;
mod source;

pub use fader::Fader;
pub use master::MasterAdapter;
pub use mix::WaveMix;
pub use source::WaveSource;

use crate::types::StereoSample;

/// A node in the mixing graph
///
/// Positions are absolute stereo frame offsets on the project timeline at
/// [`SAMPLE_RATE`](crate::types::SAMPLE_RATE).
pub trait SignalSource: Send + Sync {
    /// Whether every sample in `[position, position + count)` is available
    ///
    /// Playback may use this to wait for material that is still rendering.
    fn is_ready(&self, position: usize, count: usize) -> bool;

    /// Add this node's output for `[position, position + buffer.len())` into `buffer`
    ///
    /// Nodes always add, never overwrite. Windows outside the node's extent
    /// contribute nothing.
    fn mix(&self, position: usize, buffer: &mut [StereoSample]);

    /// First frame after the node's last sample
    fn end_frame(&self) -> usize;
}
