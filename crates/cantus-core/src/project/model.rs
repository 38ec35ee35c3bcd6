//! Tracks, parts and notes as seen by the render core
//!
//! This is the read-side of the editor's model: enough structure to segment
//! voice parts into phrases and to place wave clips on the timeline.
//! Persistence and editing live elsewhere.

use std::sync::{Arc, Mutex};

use super::PrepError;
use crate::render::Renderer;
use crate::types::Sample;

/// Ticks per quarter note used by new projects
pub const DEFAULT_RESOLUTION: u32 = 480;

/// The project shared between editor and render threads
///
/// The mutex is the project-wide lock: hold it only long enough to take a
/// phrase snapshot, never across a renderer call.
pub type SharedProject = Arc<Mutex<Project>>;

/// A multi-track vocal project
pub struct Project {
    pub name: String,
    /// Tempo in beats per minute (single tempo for the whole project)
    pub bpm: f64,
    /// Ticks per quarter note
    pub resolution: u32,
    pub tracks: Vec<Track>,
    pub parts: Vec<Part>,
}

impl Project {
    /// Create an empty project at the given tempo
    pub fn new(name: impl Into<String>, bpm: f64) -> Self {
        Self {
            name: name.into(),
            bpm,
            resolution: DEFAULT_RESOLUTION,
            tracks: Vec::new(),
            parts: Vec::new(),
        }
    }

    /// Wrap the project in the project-wide lock
    pub fn into_shared(self) -> SharedProject {
        Arc::new(Mutex::new(self))
    }

    /// Append a track and return its index
    pub fn add_track(&mut self, name: impl Into<String>, renderer: Arc<dyn Renderer>) -> usize {
        let track_no = self.tracks.len();
        self.tracks.push(Track {
            track_no,
            name: name.into(),
            mute: false,
            volume_db: 0.0,
            renderer,
        });
        track_no
    }

    /// Milliseconds per tick at the project tempo
    pub fn ms_per_tick(&self) -> f64 {
        60_000.0 / (self.bpm * f64::from(self.resolution))
    }

    /// Convert a tick position to milliseconds
    pub fn tick_to_ms(&self, tick: i64) -> f64 {
        tick as f64 * self.ms_per_tick()
    }

    /// Check that ticks can be converted to time
    pub fn validate_tempo(&self) -> Result<(), PrepError> {
        if !(self.bpm.is_finite() && self.bpm > 0.0) || self.resolution == 0 {
            return Err(PrepError::InvalidTempo {
                bpm: self.bpm,
                resolution: self.resolution,
            });
        }
        Ok(())
    }
}

/// A mixer track
#[derive(Clone)]
pub struct Track {
    /// Index of this track in [`Project::tracks`]
    pub track_no: usize,
    pub name: String,
    pub mute: bool,
    /// Fader volume in decibels
    pub volume_db: f32,
    /// Synthesis backend selected for this track's voice
    pub renderer: Arc<dyn Renderer>,
}

/// A clip on a track
#[derive(Clone)]
pub enum Part {
    Voice(VoicePart),
    Wave(WavePart),
}

impl Part {
    /// Index of the owning track
    pub fn track_no(&self) -> usize {
        match self {
            Part::Voice(part) => part.track_no,
            Part::Wave(part) => part.track_no,
        }
    }

    /// Start tick on the project timeline
    pub fn position(&self) -> i64 {
        match self {
            Part::Voice(part) => part.position,
            Part::Wave(part) => part.position,
        }
    }
}

/// A part containing sung notes
#[derive(Debug, Clone, Default)]
pub struct VoicePart {
    pub track_no: usize,
    pub position: i64,
    pub duration: i64,
    pub notes: Vec<Note>,
}

/// A sung note
#[derive(Debug, Clone, Default)]
pub struct Note {
    /// Start tick relative to the part
    pub position: i64,
    /// Length in ticks
    pub duration: i64,
    /// MIDI note number
    pub tone: i32,
    pub lyric: String,
    /// Phonemizer output; empty means "sing the lyric as one phone"
    pub phonemes: Vec<Phoneme>,
}

impl Note {
    /// End tick relative to the part
    pub fn end(&self) -> i64 {
        self.position + self.duration
    }
}

/// One phoneme of a note
#[derive(Debug, Clone, PartialEq)]
pub struct Phoneme {
    pub symbol: String,
    /// Start relative to the note, negative for consonants sung ahead of the beat
    pub offset: i64,
}

/// A pre-recorded audio clip
#[derive(Debug, Clone, Default)]
pub struct WavePart {
    pub track_no: usize,
    pub position: i64,
    pub duration: i64,
    /// Decoded interleaved samples at [`SAMPLE_RATE`](crate::types::SAMPLE_RATE), if loaded
    pub samples: Option<Arc<Vec<Sample>>>,
    pub channels: u16,
    /// Leading audio to skip (ms)
    pub skip_ms: f64,
}
