//! Phrase preparation under the project-wide lock
//!
//! Everything a render pass reads from the project is copied out here, in one
//! short critical section. The resulting snapshot is immutable and is read
//! without locking by the background threads, so edits made while a pass runs
//! never reach it.

use std::sync::Arc;

use super::RenderError;
use crate::project::{Part, Phrase, PrepError, Project, SharedProject, Track};
use crate::signal::WaveSource;
use crate::types::Sample;

/// Segment every voice part of `track` into phrases
///
/// Parts are taken in project order; the caller holds the project lock.
pub fn prepare_track(track: &Track, project: &Project) -> Result<Vec<Phrase>, PrepError> {
    let mut phrases = Vec::new();
    for part in &project.parts {
        if let Part::Voice(voice) = part {
            if voice.track_no == track.track_no {
                phrases.extend(Phrase::from_part(project, track, voice)?);
            }
        }
    }
    Ok(phrases)
}

/// Phrases of every track, in track order
pub fn prepare_project(project: &Project) -> Result<Vec<Phrase>, PrepError> {
    let mut phrases = Vec::new();
    for track in &project.tracks {
        phrases.extend(prepare_track(track, project)?);
    }
    Ok(phrases)
}

/// A wave part resolved to milliseconds
#[derive(Debug, Clone)]
pub struct WaveClip {
    pub position_ms: f64,
    pub duration_ms: f64,
    pub skip_ms: f64,
    pub channels: u16,
    /// Decoded samples; `None` leaves the clip silent
    pub samples: Option<Arc<Vec<Sample>>>,
}

impl WaveClip {
    /// Build the clip's leaf, pre-filled when samples are decoded
    pub fn to_source(&self) -> WaveSource {
        let source = WaveSource::new(
            self.position_ms,
            self.duration_ms,
            self.skip_ms,
            self.channels,
        );
        match &self.samples {
            Some(samples) => source.set_shared_samples(samples.clone()),
            None => source.set_samples(Vec::new()),
        }
        source
    }
}

/// Render inputs of one track
#[derive(Clone)]
pub struct TrackSnapshot {
    pub track_no: usize,
    pub mute: bool,
    pub volume_db: f32,
    pub phrases: Vec<Phrase>,
    pub wave_clips: Vec<WaveClip>,
}

impl TrackSnapshot {
    /// Phone count across all phrases (progress units)
    pub fn phone_count(&self) -> usize {
        self.phrases.iter().map(|p| p.phones().len()).sum()
    }
}

/// Everything a render pass needs, detached from the project
#[derive(Clone)]
pub struct ProjectSnapshot {
    pub ms_per_tick: f64,
    pub tracks: Vec<TrackSnapshot>,
}

impl ProjectSnapshot {
    pub fn tick_to_ms(&self, tick: i64) -> f64 {
        tick as f64 * self.ms_per_tick
    }

    /// All phrases of all tracks, in track order
    pub fn phrases(&self) -> impl Iterator<Item = &Phrase> {
        self.tracks.iter().flat_map(|t| t.phrases.iter())
    }
}

/// Take a consistent snapshot of the project
///
/// Holds the project lock only for the copy. Fails if the lock is poisoned
/// or the project data cannot be segmented.
pub fn snapshot_project(project: &SharedProject) -> Result<ProjectSnapshot, RenderError> {
    let project = project
        .lock()
        .map_err(|_| RenderError::ProjectLockPoisoned)?;

    project.validate_tempo()?;
    for part in &project.parts {
        if part.track_no() >= project.tracks.len() {
            return Err(PrepError::TrackOutOfRange {
                part_position: part.position(),
                track_no: part.track_no(),
            }
            .into());
        }
    }

    let mut tracks = Vec::with_capacity(project.tracks.len());
    for track in &project.tracks {
        let wave_clips = project
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Wave(wave) if wave.track_no == track.track_no => Some(WaveClip {
                    position_ms: project.tick_to_ms(wave.position),
                    duration_ms: project.tick_to_ms(wave.duration),
                    skip_ms: wave.skip_ms,
                    channels: wave.channels,
                    samples: wave.samples.clone(),
                }),
                _ => None,
            })
            .collect();

        tracks.push(TrackSnapshot {
            track_no: track.track_no,
            mute: track.mute,
            volume_db: track.volume_db,
            phrases: prepare_track(track, &project)?,
            wave_clips,
        });
    }

    log::debug!(
        "[PREP] Snapshot of '{}': {} tracks, {} phrases",
        project.name,
        tracks.len(),
        tracks.iter().map(|t| t.phrases.len()).sum::<usize>()
    );

    Ok(ProjectSnapshot {
        ms_per_tick: project.ms_per_tick(),
        tracks,
    })
}
