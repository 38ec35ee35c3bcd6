//! Phrase segmentation
//!
//! A phrase is a run of notes sung without a rest. Each phrase is rendered by
//! one renderer call and lands in one leaf of the mixing graph.

use std::sync::Arc;

use super::{Note, PrepError, Project, Track, VoicePart};
use crate::render::Renderer;

/// One phone of a phrase
#[derive(Debug, Clone, PartialEq)]
pub struct Phone {
    /// Start tick relative to the phrase position
    pub position: i64,
    /// Length in ticks
    pub duration: i64,
    pub phoneme: String,
    /// MIDI note number of the owning note
    pub tone: i32,
}

impl Phone {
    /// End tick relative to the phrase position
    pub fn end(&self) -> i64 {
        self.position + self.duration
    }
}

/// An immutable, renderable run of phones
///
/// Phones are non-empty, time-ordered and non-overlapping. The renderer is
/// fixed at construction.
#[derive(Clone)]
pub struct Phrase {
    track_no: usize,
    position: i64,
    phones: Vec<Phone>,
    renderer: Arc<dyn Renderer>,
    tick_to_ms: f64,
}

impl Phrase {
    /// Build a phrase, checking the phone invariants
    pub fn new(
        track_no: usize,
        position: i64,
        phones: Vec<Phone>,
        renderer: Arc<dyn Renderer>,
        tick_to_ms: f64,
    ) -> Result<Self, PrepError> {
        if phones.is_empty() {
            return Err(PrepError::EmptyPhrase);
        }
        for pair in phones.windows(2) {
            if pair[1].position < pair[0].end() || pair[0].duration <= 0 {
                return Err(PrepError::PhonemeOrder {
                    symbol: pair[1].phoneme.clone(),
                    position: position + pair[1].position,
                });
            }
        }
        Ok(Self {
            track_no,
            position,
            phones,
            renderer,
            tick_to_ms,
        })
    }

    /// Segment a voice part into phrases
    ///
    /// Notes are taken in time order; a note that starts after the previous
    /// one ended opens a new phrase. Phones are positioned relative to the
    /// part, so every phrase of a part shares the part's position.
    pub fn from_part(
        project: &Project,
        track: &Track,
        part: &VoicePart,
    ) -> Result<Vec<Phrase>, PrepError> {
        let mut notes: Vec<&Note> = part.notes.iter().filter(|n| n.duration > 0).collect();
        notes.sort_by_key(|n| n.position);

        let mut groups: Vec<Vec<&Note>> = Vec::new();
        let mut prev_end: Option<i64> = None;
        for note in notes {
            match prev_end {
                Some(end) if note.position < end => {
                    return Err(PrepError::OverlappingNotes {
                        part_position: part.position,
                        position: part.position + note.position,
                    });
                }
                Some(end) if note.position == end => {
                    if let Some(group) = groups.last_mut() {
                        group.push(note);
                    }
                }
                _ => groups.push(vec![note]),
            }
            prev_end = Some(note.end());
        }

        groups
            .into_iter()
            .map(|group| {
                let phones = phones_for_notes(&group)?;
                Phrase::new(
                    track.track_no,
                    part.position,
                    phones,
                    track.renderer.clone(),
                    project.ms_per_tick(),
                )
            })
            .collect()
    }

    /// Index of the owning track
    pub fn track_no(&self) -> usize {
        self.track_no
    }

    /// Tick position phones are relative to
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Phones in time order
    pub fn phones(&self) -> &[Phone] {
        &self.phones
    }

    /// Renderer chosen for this phrase
    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    /// Milliseconds per tick
    pub fn tick_to_ms(&self) -> f64 {
        self.tick_to_ms
    }

    pub fn first_phone(&self) -> &Phone {
        &self.phones[0]
    }

    pub fn last_phone(&self) -> &Phone {
        &self.phones[self.phones.len() - 1]
    }

    /// Absolute tick at which the phrase starts sounding
    ///
    /// Render passes process phrases in ascending order of this key.
    pub fn start_tick(&self) -> i64 {
        self.position + self.first_phone().position
    }

    /// Absolute tick at which the last phone ends
    pub fn end_tick(&self) -> i64 {
        self.position + self.last_phone().end()
    }

    /// Phrase start in milliseconds
    pub fn start_ms(&self) -> f64 {
        self.start_tick() as f64 * self.tick_to_ms
    }

    /// Phrase end in milliseconds
    pub fn end_ms(&self) -> f64 {
        self.end_tick() as f64 * self.tick_to_ms
    }
}

/// Flatten a run of adjacent notes into phones
///
/// Each phone lasts until the next phone starts; the final phone ends with
/// the final note.
fn phones_for_notes(notes: &[&Note]) -> Result<Vec<Phone>, PrepError> {
    let mut starts: Vec<(i64, String, i32)> = Vec::new();
    for note in notes {
        if note.phonemes.is_empty() {
            starts.push((note.position, note.lyric.clone(), note.tone));
            continue;
        }
        let mut phonemes: Vec<_> = note.phonemes.iter().collect();
        phonemes.sort_by_key(|p| p.offset);
        for phoneme in phonemes {
            starts.push((note.position + phoneme.offset, phoneme.symbol.clone(), note.tone));
        }
    }

    let phrase_end = notes.last().map(|n| n.end()).unwrap_or(0);
    let mut phones = Vec::with_capacity(starts.len());
    for (i, (start, symbol, tone)) in starts.iter().enumerate() {
        let end = starts.get(i + 1).map(|next| next.0).unwrap_or(phrase_end);
        if end <= *start {
            return Err(PrepError::PhonemeOrder {
                symbol: symbol.clone(),
                position: *start,
            });
        }
        phones.push(Phone {
            position: *start,
            duration: end - start,
            phoneme: symbol.clone(),
            tone: *tone,
        });
    }
    Ok(phones)
}
