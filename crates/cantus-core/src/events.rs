//! Notifications from the render core to the UI
//!
//! Render threads publish progress and user-facing messages through a
//! [`NotificationSink`]. Delivery is one-way and fire-and-forget: the core
//! never waits for a subscriber.

use crossbeam::channel::{self, Receiver, Sender, TrySendError};

/// Events published by render passes
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// Progress bar update; `percent` is 0-100, a reset is `(0, "")`
    Progress { percent: f64, label: String },

    /// A message the user should see (render failures)
    UserMessage { message: String },
}

impl RenderEvent {
    /// Whether this is the progress reset sent at the end of a pass
    pub fn is_progress_reset(&self) -> bool {
        matches!(self, Self::Progress { percent, label } if *percent == 0.0 && label.is_empty())
    }
}

/// One-way destination for render notifications
pub trait NotificationSink: Send + Sync {
    /// Publish an event; must not block the caller
    fn publish(&self, event: RenderEvent);
}

/// Bounded event bus fanning render events out to UI subscribers
///
/// Subscribers share one queue, so each event is taken by exactly one
/// receiver. A full bus drops new events rather than stalling a render thread.
pub struct EventBus {
    sender: Sender<RenderEvent>,
    receiver: Receiver<RenderEvent>,
}

impl EventBus {
    /// Create a new event bus with bounded capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = channel::bounded(capacity);
        Self { sender, receiver }
    }

    /// Get a receiver for consuming events
    pub fn subscribe(&self) -> Receiver<RenderEvent> {
        self.receiver.clone()
    }

    /// Take every event currently queued
    pub fn drain(&self) -> Vec<RenderEvent> {
        self.receiver.try_iter().collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl NotificationSink for EventBus {
    fn publish(&self, event: RenderEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                log::debug!("[EVENTS] Bus full, dropping {:?}", event);
            }
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("[EVENTS] Bus disconnected");
            }
        }
    }
}
