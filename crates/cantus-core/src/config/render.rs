//! Render orchestration settings

use serde::{Deserialize, Serialize};

use crate::types::SILENCE_FLOOR_DB;

/// Tunables for render passes
///
/// Every field has a default, so a partial YAML file only overrides what it
/// names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Wait before a pre-render pass reads the project (ms)
    pub prerender_debounce_ms: u64,
    /// Volume applied to muted tracks (dB)
    pub muted_volume_db: f32,
    /// Time a fader takes to move across full scale (ms)
    pub fader_ramp_ms: f64,
    /// Silence appended after the last sample of a mixdown (ms)
    pub mixdown_tail_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            prerender_debounce_ms: 200,
            muted_volume_db: SILENCE_FLOOR_DB,
            fader_ramp_ms: 10.0,
            mixdown_tail_ms: 500,
        }
    }
}
