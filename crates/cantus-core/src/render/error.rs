//! Render error types

use thiserror::Error;

use crate::project::PrepError;

/// Errors produced by render passes and renderers
#[derive(Error, Debug)]
pub enum RenderError {
    /// The pass was superseded or cancelled; not a fault
    #[error("Render cancelled")]
    Cancelled,

    /// A renderer failed on a specific phrase
    #[error("Failed to render phrase on track {track_no} at tick {position}: {message}")]
    PhraseFailed {
        track_no: usize,
        position: i64,
        message: String,
    },

    /// Error reported by a renderer implementation
    #[error("Renderer error: {0}")]
    Renderer(String),

    /// Phrase segmentation rejected the project data
    #[error("Failed to prepare phrases: {0}")]
    Preparation(#[from] PrepError),

    /// Another thread panicked while holding the project lock
    #[error("Project lock poisoned")]
    ProjectLockPoisoned,

    /// The OS refused to start a render thread
    #[error("Failed to spawn render thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    /// A render thread panicked
    #[error("Render thread panicked")]
    ThreadPanicked,
}

impl RenderError {
    /// Whether this error is the expected cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
