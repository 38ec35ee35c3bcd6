//! The synthesis capability consumed by render passes

use super::{CancellationToken, Progress, RenderError};
use crate::project::Phrase;
use crate::types::Sample;

/// Where a phrase's audio will sit on the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderLayout {
    /// Position of the phrase's first phone (ms)
    pub position_ms: f64,
    /// Audio the renderer emits before `position_ms` (consonant lead-in)
    pub leading_ms: f64,
    /// Expected total output length including the lead-in
    pub estimated_length_ms: f64,
}

impl RenderLayout {
    /// Timeline position of the first output sample
    pub fn start_ms(&self) -> f64 {
        self.position_ms - self.leading_ms
    }

    /// Timeline position just past the expected last sample
    pub fn end_ms(&self) -> f64 {
        self.start_ms() + self.estimated_length_ms
    }
}

/// Output of one phrase render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    /// Mono samples at [`SAMPLE_RATE`](crate::types::SAMPLE_RATE), starting `leading_ms` before `position_ms`
    pub samples: Vec<Sample>,
    pub position_ms: f64,
    pub leading_ms: f64,
}

impl RenderResult {
    /// Timeline position of the first sample
    pub fn start_ms(&self) -> f64 {
        self.position_ms - self.leading_ms
    }
}

/// A phrase synthesis backend
///
/// `render` is called from render threads and may block for as long as
/// synthesis takes. Implementations must:
/// - leave the phrase untouched
/// - call [`Progress::complete_one`] once per phone
/// - return [`RenderError::Cancelled`] promptly once `cancellation` fires
///
/// `speculative` marks pre-render warm-up calls whose output is discarded;
/// a backend may use them to fill its own cache.
pub trait Renderer: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &str;

    /// Predict where the phrase's output will land without rendering it
    fn layout(&self, phrase: &Phrase) -> RenderLayout;

    /// Synthesise the phrase
    fn render(
        &self,
        phrase: &Phrase,
        progress: &Progress,
        cancellation: &CancellationToken,
        speculative: bool,
    ) -> Result<RenderResult, RenderError>;
}
