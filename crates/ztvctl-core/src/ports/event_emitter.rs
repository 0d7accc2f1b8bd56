//! Event emitter trait for lifecycle event fan-out.
//!
//! Implementations handle transport details (broadcast channels, SSE, logging).

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::warn;

use crate::events::WorkerEvent;

/// Trait for emitting worker lifecycle events.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and contexts that don't need events
/// - `FanoutEmitter` - Delivers to several listeners with failure isolation
/// - Runtime adapters (broadcast channel, logging)
pub trait WorkerEventEmitter: Send + Sync {
    /// Emit a lifecycle event. Must not block.
    fn emit(&self, event: WorkerEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn WorkerEventEmitter>;
}

/// A no-op event emitter.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    pub const fn new() -> Self {
        Self
    }
}

impl WorkerEventEmitter for NoopEmitter {
    fn emit(&self, _event: WorkerEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn WorkerEventEmitter> {
        Box::new(self.clone())
    }
}

/// Delivers each event to every registered listener.
///
/// A listener that panics is logged and skipped; the remaining listeners
/// still receive the event.
#[derive(Clone, Default)]
pub struct FanoutEmitter {
    listeners: Vec<Arc<dyn WorkerEventEmitter>>,
}

impl FanoutEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, listener: Arc<dyn WorkerEventEmitter>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn push(&mut self, listener: Arc<dyn WorkerEventEmitter>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl WorkerEventEmitter for FanoutEmitter {
    fn emit(&self, event: WorkerEvent) {
        for (index, listener) in self.listeners.iter().enumerate() {
            let event = event.clone();
            if catch_unwind(AssertUnwindSafe(|| listener.emit(event))).is_err() {
                warn!(listener = index, "Worker event listener panicked");
            }
        }
    }

    fn clone_box(&self) -> Box<dyn WorkerEventEmitter> {
        Box::new(self.clone())
    }
}
