//! Debounced speculative rendering ahead of the playback cursor

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::engine::render_phrase;
use super::{snapshot_project, CancellationSlot, CancellationToken, Progress, RenderEngine, RenderError};
use crate::events::NotificationSink;
use crate::project::{Phrase, SharedProject};

/// How a pre-render pass ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreRenderOutcome {
    /// A newer pass took the slot, during the debounce or mid-render
    Superseded,
    /// Every phrase ends before the start tick
    NothingToRender,
    /// All remaining phrases were rendered speculatively
    Completed { phrases: usize },
    /// The pass failed; the error was logged and not shown to the user
    Failed(String),
}

/// Handle to a pre-render pass
pub struct PreRenderTask {
    handle: JoinHandle<PreRenderOutcome>,
}

impl PreRenderTask {
    /// Wait for the pass to end; a panicked pass counts as failed
    pub fn join(self) -> PreRenderOutcome {
        self.handle
            .join()
            .unwrap_or_else(|_| PreRenderOutcome::Failed("pre-render thread panicked".to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl RenderEngine {
    /// Warm the renderers for everything after `start_tick`
    ///
    /// Supersedes whatever pass held `slot` and returns immediately. The pass
    /// waits for the configured debounce before reading the project, so a
    /// burst of edits each calling this results in a single pass. Failures
    /// never reach the user.
    pub fn pre_render_project(
        &self,
        start_tick: i64,
        slot: &CancellationSlot,
    ) -> Result<PreRenderTask, RenderError> {
        let token = slot.replace();
        let project = self.project().clone();
        let sink = self.sink().clone();
        let debounce = Duration::from_millis(self.config().prerender_debounce_ms);

        let handle = thread::Builder::new()
            .name("pre-render".to_string())
            .spawn(move || {
                thread::sleep(debounce);
                match pre_render(&project, start_tick, sink, &token) {
                    Ok(outcome) => outcome,
                    Err(e) if token.is_cancelled() || e.is_cancelled() => {
                        log::debug!("[PRERENDER] Superseded");
                        PreRenderOutcome::Superseded
                    }
                    Err(e) => {
                        log::error!("[PRERENDER] Failed to pre-render: {}", e);
                        PreRenderOutcome::Failed(e.to_string())
                    }
                }
            })?;

        Ok(PreRenderTask { handle })
    }
}

fn pre_render(
    project: &SharedProject,
    start_tick: i64,
    sink: Arc<dyn NotificationSink>,
    token: &CancellationToken,
) -> Result<PreRenderOutcome, RenderError> {
    token.check()?;

    let snapshot = snapshot_project(project)?;
    let mut phrases: Vec<&Phrase> = snapshot
        .phrases()
        .filter(|phrase| phrase.end_tick() > start_tick)
        .collect();
    if phrases.is_empty() {
        return Ok(PreRenderOutcome::NothingToRender);
    }
    phrases.sort_by_key(|phrase| phrase.start_tick());

    let total = phrases.iter().map(|p| p.phones().len()).sum();
    let progress = Progress::new(total, sink);
    log::debug!(
        "[PRERENDER] Warming {} phrases after tick {}",
        phrases.len(),
        start_tick
    );

    let result = phrases.iter().try_for_each(|phrase| {
        token.check()?;
        render_phrase(phrase, &progress, token, true).map(|_| ())
    });
    progress.clear();
    result?;

    Ok(PreRenderOutcome::Completed {
        phrases: phrases.len(),
    })
}
