//! Progress tracking across the phones of a render pass

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::events::{NotificationSink, RenderEvent};

/// Thread-safe completion counter over a fixed number of units
///
/// Renderers call [`complete_one`](Self::complete_one) once per phone, from
/// any thread. Percentages are clamped to 100, so extra completions are
/// harmless. A tracker with zero total reports 100% on every completion.
pub struct Progress {
    total: usize,
    completed: AtomicUsize,
    sink: Arc<dyn NotificationSink>,
}

impl Progress {
    /// Create a tracker expecting `total` units
    pub fn new(total: usize, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            sink,
        }
    }

    /// Record one finished unit and publish the new percentage
    pub fn complete_one(&self, info: &str) {
        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        self.sink.publish(RenderEvent::Progress {
            percent: percent(completed, self.total),
            label: info.to_string(),
        });
    }

    /// Publish the progress reset `(0, "")`
    pub fn clear(&self) {
        self.sink.publish(RenderEvent::Progress {
            percent: 0.0,
            label: String::new(),
        });
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }
}

fn percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (completed as f64 * 100.0 / total as f64).min(100.0)
}
