//! Worker event sinks.

use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use ztvctl_core::{WorkerEvent, WorkerEventEmitter};

/// Broadcast channel capacity for worker events
const CHANNEL_CAPACITY: usize = 64;

/// Broadcaster for worker lifecycle events (CLI, tests).
#[derive(Clone)]
pub struct WorkerEventBroadcaster {
    sender: broadcast::Sender<WorkerEvent>,
}

impl WorkerEventBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to worker events
    pub fn subscribe(&self) -> broadcast::Receiver<WorkerEvent> {
        self.sender.subscribe()
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for WorkerEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerEventEmitter for WorkerEventBroadcaster {
    fn emit(&self, event: WorkerEvent) {
        // Only log if there are receivers (avoid spam when nobody listens)
        if self.sender.receiver_count() > 0 {
            debug!(?event, "Broadcasting worker event");
            let _ = self.sender.send(event);
        }
    }

    fn clone_box(&self) -> Box<dyn WorkerEventEmitter> {
        Box::new(self.clone())
    }
}

/// Logs every worker event.
#[derive(Debug, Clone, Default)]
pub struct TracingEmitter;

impl WorkerEventEmitter for TracingEmitter {
    fn emit(&self, event: WorkerEvent) {
        match event {
            WorkerEvent::Started { pid } => info!(?pid, "Worker started"),
            WorkerEvent::Stopped { code } => info!(?code, "Worker stopped"),
            WorkerEvent::Restarting => info!("Worker restarting"),
            WorkerEvent::Error { message } => warn!(%message, "Worker error"),
        }
    }

    fn clone_box(&self) -> Box<dyn WorkerEventEmitter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let broadcaster = WorkerEventBroadcaster::new();
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.emit(WorkerEvent::Restarting);
        assert_eq!(rx.recv().await.unwrap(), WorkerEvent::Restarting);
    }

    #[test]
    fn test_emit_without_subscribers_is_noop() {
        let broadcaster = WorkerEventBroadcaster::new();
        broadcaster.emit(WorkerEvent::stopped(None));
        TracingEmitter.emit(WorkerEvent::error("boom"));
    }
}
