//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use cantus_core::project::{Note, Part, Phoneme, Project, SharedProject, VoicePart, WavePart};
use cantus_core::render::{
    CancellationToken, Progress, RenderError, RenderLayout, RenderResult, Renderer,
};
use cantus_core::{ms_to_frames, Sample};

/// Renderer whose output sample `i` is `ramp_value(i)`
pub struct RampRenderer {
    pub delay: Duration,
    pub leading_ms: f64,
    started: Mutex<Vec<i64>>,
}

impl RampRenderer {
    pub fn new(delay: Duration, leading_ms: f64) -> Self {
        Self {
            delay,
            leading_ms,
            started: Mutex::new(Vec::new()),
        }
    }

    /// Start ticks of every phrase passed to `render`, in call order
    pub fn started(&self) -> Vec<i64> {
        self.started.lock().unwrap().clone()
    }
}

pub fn ramp_value(i: usize) -> Sample {
    ((i % 97) as Sample + 1.0) / 100.0
}

impl Renderer for RampRenderer {
    fn name(&self) -> &str {
        "ramp"
    }

    fn layout(&self, phrase: &cantus_core::project::Phrase) -> RenderLayout {
        RenderLayout {
            position_ms: phrase.start_ms(),
            leading_ms: self.leading_ms,
            estimated_length_ms: phrase.end_ms() - phrase.start_ms() + self.leading_ms,
        }
    }

    fn render(
        &self,
        phrase: &cantus_core::project::Phrase,
        progress: &Progress,
        cancellation: &CancellationToken,
        _speculative: bool,
    ) -> Result<RenderResult, RenderError> {
        self.started.lock().unwrap().push(phrase.start_tick());

        let deadline = Instant::now() + self.delay;
        while Instant::now() < deadline {
            cancellation.check()?;
            thread::sleep(Duration::from_millis(1));
        }
        cancellation.check()?;

        for phone in phrase.phones() {
            progress.complete_one(&phone.phoneme);
        }
        let layout = self.layout(phrase);
        let frames = ms_to_frames(layout.estimated_length_ms);
        Ok(RenderResult {
            samples: (0..frames).map(ramp_value).collect(),
            position_ms: layout.position_ms,
            leading_ms: layout.leading_ms,
        })
    }
}

/// A two-phone note at `position` (relative to its part)
pub fn two_phone_note(position: i64, duration: i64) -> Note {
    Note {
        position,
        duration,
        tone: 67,
        lyric: "ka".to_string(),
        phonemes: vec![
            Phoneme {
                symbol: "k".to_string(),
                offset: 0,
            },
            Phoneme {
                symbol: "a".to_string(),
                offset: duration / 4,
            },
        ],
    }
}

/// One voice track with one single-note phrase per entry of `starts`
pub fn voice_project(renderer: Arc<dyn Renderer>, starts: &[i64]) -> SharedProject {
    let mut project = Project::new("integration", 120.0);
    project.add_track("lead", renderer);
    for &start in starts {
        project.parts.push(Part::Voice(VoicePart {
            track_no: 0,
            position: start,
            duration: 480,
            notes: vec![two_phone_note(0, 480)],
        }));
    }
    project.into_shared()
}

/// Track 0 sings ticks [0, 480] in two phones; track 1 holds a decoded clip
pub fn end_to_end_project(renderer: Arc<dyn Renderer>, clip: Vec<Sample>) -> SharedProject {
    let mut project = Project::new("end-to-end", 120.0);
    project.add_track("voice", renderer.clone());
    project.add_track("backing", renderer);
    project.parts.push(Part::Voice(VoicePart {
        track_no: 0,
        position: 0,
        duration: 480,
        notes: vec![two_phone_note(0, 480)],
    }));
    project.parts.push(Part::Wave(WavePart {
        track_no: 1,
        position: 0,
        duration: 960,
        samples: Some(Arc::new(clip)),
        channels: 1,
        skip_ms: 0.0,
    }));
    project.into_shared()
}
