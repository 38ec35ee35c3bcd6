//! Cooperative cancellation and the single-flight slot

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use super::RenderError;

/// A one-shot cancellation flag
///
/// Once cancelled a token stays cancelled. A child token created with
/// [`child`](Self::child) also reports cancelled when its parent is.
///
/// Tokens are reference counted: a superseded token is "released" by dropping
/// the slot's reference, but it stays valid (and reads as cancelled) for as
/// long as any render thread still holds it.
#[derive(Debug, Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    parent: Option<Arc<CancellationToken>>,
}

impl CancellationToken {
    /// Create a fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token linked to this one
    pub fn child(self: &Arc<Self>) -> Arc<CancellationToken> {
        Arc::new(Self {
            cancelled: AtomicBool::new(false),
            parent: Some(self.clone()),
        })
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether this token or any ancestor was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }

    /// `Err(RenderError::Cancelled)` if cancelled
    pub fn check(&self) -> Result<(), RenderError> {
        if self.is_cancelled() {
            Err(RenderError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Shared slot holding the token of the active render pass
///
/// Each render entry point calls [`replace`](Self::replace) before doing any
/// work. The swap is atomic; the previous token is cancelled only after the
/// new one is installed, so a racing pass can never cancel its successor.
#[derive(Debug, Default)]
pub struct CancellationSlot {
    current: ArcSwapOption<CancellationToken>,
}

impl CancellationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a fresh token and cancel the one it supersedes
    pub fn replace(&self) -> Arc<CancellationToken> {
        let fresh = Arc::new(CancellationToken::new());
        if let Some(previous) = self.current.swap(Some(fresh.clone())) {
            previous.cancel();
            log::debug!("[CANCEL] Superseded previous render pass");
        }
        fresh
    }

    /// Token of the active pass, if any
    pub fn current(&self) -> Option<Arc<CancellationToken>> {
        self.current.load_full()
    }

    /// Cancel the active pass without starting a new one
    pub fn cancel(&self) {
        if let Some(token) = self.current.swap(None) {
            token.cancel();
        }
    }
}
