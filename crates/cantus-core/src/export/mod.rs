//! Offline mixdown to WAV
//!
//! Renders every track to completion, runs the per-track mixes through faders
//! and a master adapter, and writes the result as a 32-bit float stereo WAV.

use std::path::Path;
use std::sync::Arc;

use hound::{SampleFormat, WavSpec, WavWriter};
use thiserror::Error;

use crate::config::RenderConfig;
use crate::render::{CancellationSlot, RenderEngine, RenderError};
use crate::signal::{Fader, MasterAdapter, SignalSource, WaveMix};
use crate::types::{ms_to_frames, Sample, StereoSample, SAMPLE_RATE};

/// Frames pulled from the master per write
const BLOCK_FRAMES: usize = 4096;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Summary of a written mixdown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixdownStats {
    /// Stereo frames written, including the tail
    pub frames: usize,
    /// Largest absolute sample value
    pub peak: Sample,
}

/// Render the engine's project and write it to `path`
pub fn write_mixdown(
    engine: &RenderEngine,
    slot: &CancellationSlot,
    path: &Path,
) -> Result<MixdownStats, ExportError> {
    let (mixes, gains): (Vec<WaveMix>, Vec<Sample>) = engine
        .render_track_mixes(slot)?
        .into_iter()
        .map(|track| (track.mix, track.gain))
        .unzip();
    write_mixes(mixes, &gains, path, engine.config())
}

/// Mix per-track mixes with their gains and write them to `path`
///
/// A track without a gain entry plays at unity.
pub fn write_mixes(
    mixes: Vec<WaveMix>,
    gains: &[Sample],
    path: &Path,
    config: &RenderConfig,
) -> Result<MixdownStats, ExportError> {
    let faders: Vec<Arc<dyn SignalSource>> = mixes
        .into_iter()
        .enumerate()
        .map(|(i, mix)| {
            let fader = Fader::with_ramp_ms(Arc::new(mix), config.fader_ramp_ms);
            fader.set_scale(gains.get(i).copied().unwrap_or(1.0));
            fader.set_scale_to_target();
            Arc::new(fader) as Arc<dyn SignalSource>
        })
        .collect();
    let master = MasterAdapter::new(WaveMix::new(faders));
    let total = master.end_frame() + ms_to_frames(config.mixdown_tail_ms as f64);

    let spec = WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;

    let mut block = vec![StereoSample::silence(); BLOCK_FRAMES];
    let mut peak: Sample = 0.0;
    let mut written = 0;
    while written < total {
        let frames = (total - written).min(BLOCK_FRAMES);
        master.read(&mut block[..frames]);
        for frame in &block[..frames] {
            writer.write_sample(frame.left)?;
            writer.write_sample(frame.right)?;
            peak = peak.max(frame.peak());
        }
        written += frames;
    }
    writer.finalize()?;

    log::info!(
        "[EXPORT] Wrote {:?}: {:.2}s, peak {:.3}",
        path,
        written as f64 / SAMPLE_RATE as f64,
        peak
    );
    Ok(MixdownStats {
        frames: written,
        peak,
    })
}
