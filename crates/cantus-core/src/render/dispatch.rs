//! Marshalling work onto the UI thread

use crossbeam::channel::{self, Receiver, Sender};

/// A unit of work to run on the UI thread
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// An execution context owned by the UI
///
/// Render threads never touch UI state directly; fault handling is wrapped
/// in a [`UiJob`] and handed to the dispatcher.
pub trait UiDispatcher: Send + Sync {
    fn dispatch(&self, job: UiJob);
}

/// Queue-backed dispatcher drained by the UI loop
///
/// The UI calls [`run_pending`](Self::run_pending) once per frame/tick.
pub struct ChannelDispatcher {
    tx: Sender<UiJob>,
    rx: Receiver<UiJob>,
}

impl ChannelDispatcher {
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self { tx, rx }
    }

    /// Run every queued job on the calling thread; returns how many ran
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Number of jobs waiting
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Default for ChannelDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl UiDispatcher for ChannelDispatcher {
    fn dispatch(&self, job: UiJob) {
        // The receiver lives in self, so the queue cannot be disconnected here
        let _ = self.tx.send(job);
    }
}
