//! Phrase preparation error types

use thiserror::Error;

/// Errors raised while segmenting the project into phrases
///
/// These surface synchronously from the call that starts a render, before
/// any background work is dispatched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrepError {
    /// Two notes of the same part overlap in time
    #[error("Overlapping notes in part at tick {part_position}: note at tick {position} starts before the previous note ends")]
    OverlappingNotes { part_position: i64, position: i64 },

    /// A phoneme starts at or before the phoneme preceding it
    #[error("Phoneme '{symbol}' at tick {position} is out of order")]
    PhonemeOrder { symbol: String, position: i64 },

    /// A phrase was built without any phones
    #[error("Phrase has no phones")]
    EmptyPhrase,

    /// A part references a track index that does not exist
    #[error("Part at tick {part_position} references missing track {track_no}")]
    TrackOutOfRange { part_position: i64, track_no: usize },

    /// Tempo or resolution cannot convert ticks to time
    #[error("Invalid tempo: {bpm} BPM at {resolution} ticks per beat")]
    InvalidTempo { bpm: f64, resolution: u32 },
}
