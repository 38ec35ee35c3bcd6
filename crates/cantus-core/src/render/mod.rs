//! Render orchestration
//!
//! Turns a project into audio by rendering phrases through their track's
//! [`Renderer`] on background threads:
//!
//! ```text
//! SharedProject ──lock──► snapshot (phrases, wave clips)
//!                              │
//!          ┌───────────────────┼────────────────────┐
//!          ▼                   ▼                    ▼
//!   render_project       render_tracks      pre_render_project
//!   (graph now, fill     (blocking full     (debounced, speculative
//!    leaves in order)     mixdown)           cache warm-up)
//! ```
//!
//! Every entry point first swaps a fresh token into a shared
//! [`CancellationSlot`], cancelling whatever pass held it. This keeps at most
//! one pass per slot doing work.

mod cancel;
mod dispatch;
mod engine;
mod error;
mod prepare;
mod prerender;
mod progress;
mod renderer;
mod tone;

pub use cancel::{CancellationSlot, CancellationToken};
pub use dispatch::{ChannelDispatcher, UiDispatcher, UiJob};
pub use engine::{ProjectRender, RenderEngine, RenderSummary, RenderTask, TrackMix};
pub use error::RenderError;
pub use prepare::{
    prepare_project, prepare_track, snapshot_project, ProjectSnapshot, TrackSnapshot, WaveClip,
};
pub use prerender::{PreRenderOutcome, PreRenderTask};
pub use progress::Progress;
pub use renderer::{RenderLayout, RenderResult, Renderer};
pub use tone::ToneRenderer;
