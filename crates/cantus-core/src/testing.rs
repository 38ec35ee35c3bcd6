//! Test collaborators shared by the unit tests

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use crate::project::Phrase;
use crate::render::{CancellationToken, Progress, RenderError, RenderLayout, RenderResult, Renderer};
use crate::types::{ms_to_frames, Sample};

const SLEEP_SLICE: Duration = Duration::from_millis(2);

/// One recorded `render` call
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    pub track_no: usize,
    pub start_tick: i64,
    pub speculative: bool,
}

/// Renderer returning a constant buffer, with scripted latency and failure
pub struct ScriptedRenderer {
    delay: Duration,
    value: Sample,
    leading_ms: f64,
    fail_at: Option<i64>,
    calls: Mutex<Vec<RenderCall>>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            value: 0.5,
            leading_ms: 0.0,
            fail_at: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Time each render takes; cancellation is checked while waiting
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Value of every returned sample
    pub fn with_value(mut self, value: Sample) -> Self {
        self.value = value;
        self
    }

    pub fn with_leading_ms(mut self, leading_ms: f64) -> Self {
        self.leading_ms = leading_ms;
        self
    }

    /// Fail the phrase starting at `start_tick`
    pub fn failing_at(mut self, start_tick: i64) -> Self {
        self.fail_at = Some(start_tick);
        self
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }

    fn wait(&self, cancellation: &CancellationToken) -> Result<(), RenderError> {
        let deadline = Instant::now() + self.delay;
        loop {
            cancellation.check()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

impl Renderer for ScriptedRenderer {
    fn name(&self) -> &str {
        "scripted"
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
        self.calls.lock().unwrap().push(RenderCall {
            track_no: phrase.track_no(),
            start_tick: phrase.start_tick(),
            speculative,
        });

        if self.fail_at == Some(phrase.start_tick()) {
            return Err(RenderError::Renderer("scripted failure".to_string()));
        }
        self.wait(cancellation)?;

        for phone in phrase.phones() {
            progress.complete_one(&phone.phoneme);
        }
        let layout = self.layout(phrase);
        Ok(RenderResult {
            samples: vec![self.value; ms_to_frames(layout.estimated_length_ms)],
            position_ms: layout.position_ms,
            leading_ms: layout.leading_ms,
        })
    }
}
