//! Fan-in node summing time-aligned sources

use std::sync::Arc;

use super::SignalSource;
use crate::types::StereoSample;

/// Sum of several sources sharing the same timeline
pub struct WaveMix {
    sources: Vec<Arc<dyn SignalSource>>,
}

impl WaveMix {
    /// Create a mix over the given sources
    pub fn new(sources: Vec<Arc<dyn SignalSource>>) -> Self {
        Self { sources }
    }

    /// Number of direct inputs
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the mix has no inputs
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SignalSource for WaveMix {
    fn is_ready(&self, position: usize, count: usize) -> bool {
        self.sources.iter().all(|s| s.is_ready(position, count))
    }

    fn mix(&self, position: usize, buffer: &mut [StereoSample]) {
        for source in &self.sources {
            source.mix(position, buffer);
        }
    }

    fn end_frame(&self) -> usize {
        self.sources.iter().map(|s| s.end_frame()).max().unwrap_or(0)
    }
}
