//! Reference renderer producing a sine tone per phone
//!
//! Stands in for a voicebank synthesiser in the mixdown tool and tests. The
//! output follows the same contract as a real backend: a lead-in before the
//! first phone, one progress unit per phone, cooperative cancellation, and a
//! cache warmed by speculative calls.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::f32::consts::TAU;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use super::{CancellationToken, Progress, RenderError, RenderLayout, RenderResult, Renderer};
use crate::project::Phrase;
use crate::types::{ms_to_frames, Sample, SAMPLE_RATE};

const DEFAULT_LEADING_MS: f64 = 30.0;
const DEFAULT_AMPLITUDE: Sample = 0.25;
/// Attack and release of each phone
const EDGE_MS: f64 = 5.0;
/// Cache entries kept before the cache is flushed
const CACHE_CAPACITY: usize = 256;

pub struct ToneRenderer {
    name: String,
    leading_ms: f64,
    amplitude: Sample,
    cache: Mutex<HashMap<u64, Arc<Vec<Sample>>>>,
}

impl ToneRenderer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            leading_ms: DEFAULT_LEADING_MS,
            amplitude: DEFAULT_AMPLITUDE,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Set the silent lead-in emitted before the first phone
    pub fn with_leading_ms(mut self, leading_ms: f64) -> Self {
        self.leading_ms = leading_ms.max(0.0);
        self
    }

    pub fn with_amplitude(mut self, amplitude: Sample) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Number of phrases currently cached
    pub fn cached(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn lookup(&self, key: u64) -> Option<Arc<Vec<Sample>>> {
        self.cache.lock().ok()?.get(&key).cloned()
    }

    fn store(&self, key: u64, samples: Arc<Vec<Sample>>) {
        if let Ok(mut cache) = self.cache.lock() {
            if cache.len() >= CACHE_CAPACITY {
                cache.clear();
            }
            cache.insert(key, samples);
        }
    }

    fn synthesize(
        &self,
        phrase: &Phrase,
        layout: &RenderLayout,
        progress: &Progress,
        cancellation: &CancellationToken,
    ) -> Result<Vec<Sample>, RenderError> {
        let mut samples = vec![0.0; ms_to_frames(layout.estimated_length_ms)];
        let edge = ms_to_frames(EDGE_MS).max(1);

        for phone in phrase.phones() {
            cancellation.check()?;

            let phone_start = (phrase.position() + phone.position) as f64 * phrase.tick_to_ms();
            let offset_ms = phone_start - layout.start_ms();
            let start = ms_to_frames(offset_ms).min(samples.len());
            let end = ms_to_frames(offset_ms + phone.duration as f64 * phrase.tick_to_ms())
                .min(samples.len());
            let length = end - start;
            let step = midi_to_hz(phone.tone) * TAU / SAMPLE_RATE as f32;

            for (i, sample) in samples[start..end].iter_mut().enumerate() {
                let envelope = (i.min(length - i) as f32 / edge as f32).min(1.0);
                // Phase follows the absolute frame so adjacent phones join smoothly
                *sample = ((start + i) as f32 * step).sin() * self.amplitude * envelope;
            }

            progress.complete_one(&format!(
                "Track {}: {}",
                phrase.track_no() + 1,
                phone.phoneme
            ));
        }
        Ok(samples)
    }
}

impl Renderer for ToneRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn layout(&self, phrase: &Phrase) -> RenderLayout {
        RenderLayout {
            position_ms: phrase.start_ms(),
            leading_ms: self.leading_ms,
            estimated_length_ms: phrase.end_ms() - phrase.start_ms() + self.leading_ms,
        }
    }

    fn render(
        &self,
        phrase: &Phrase,
        progress: &Progress,
        cancellation: &CancellationToken,
        speculative: bool,
    ) -> Result<RenderResult, RenderError> {
        let layout = self.layout(phrase);
        let key = phrase_key(phrase);

        let samples = match self.lookup(key) {
            Some(samples) => {
                for phone in phrase.phones() {
                    cancellation.check()?;
                    progress.complete_one(&format!(
                        "Track {}: {}",
                        phrase.track_no() + 1,
                        phone.phoneme
                    ));
                }
                samples
            }
            None => {
                let samples = Arc::new(self.synthesize(phrase, &layout, progress, cancellation)?);
                self.store(key, samples.clone());
                if speculative {
                    log::debug!(
                        "[{}] Cached phrase at tick {}",
                        self.name,
                        phrase.start_tick()
                    );
                }
                samples
            }
        };

        Ok(RenderResult {
            samples: samples.as_ref().clone(),
            position_ms: layout.position_ms,
            leading_ms: layout.leading_ms,
        })
    }
}

fn midi_to_hz(tone: i32) -> f32 {
    440.0 * 2f32.powf((tone - 69) as f32 / 12.0)
}

/// Identity of a phrase's audible content
fn phrase_key(phrase: &Phrase) -> u64 {
    let mut hasher = DefaultHasher::new();
    phrase.position().hash(&mut hasher);
    phrase.tick_to_ms().to_bits().hash(&mut hasher);
    for phone in phrase.phones() {
        phone.position.hash(&mut hasher);
        phone.duration.hash(&mut hasher);
        phone.phoneme.hash(&mut hasher);
        phone.tone.hash(&mut hasher);
    }
    hasher.finish()
}
