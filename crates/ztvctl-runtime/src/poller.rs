//! Periodic statistics polling.
//!
//! The poller owns a [`TelemetryEngine`] and feeds it the worker's
//! `statistics` on a fixed interval. It is policy-free: it only yields
//! reports, callers decide what to do with them.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use chrono::Utc;
use futures_util::Stream;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use ztvctl_telemetry::{BitrateReport, StatisticsSnapshot, TelemetryEngine};

use crate::controller::WorkerController;

/// Shortest accepted poll interval; `tokio::time::interval` rejects zero.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Polls worker statistics and derives bit rates.
///
/// The engine baseline is discarded whenever the worker changes (stopped,
/// restarted), so rates never span two processes.
pub struct TelemetryPoller {
    controller: Arc<WorkerController>,
    interval: Duration,
    cancel_token: CancellationToken,
    engine: TelemetryEngine,
    generation: Option<u64>,
}

impl TelemetryPoller {
    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn new(
        controller: Arc<WorkerController>,
        poll_interval: Duration,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            controller,
            interval: poll_interval.max(MIN_POLL_INTERVAL),
            cancel_token,
            engine: TelemetryEngine::new(),
            generation: None,
        }
    }

    /// Take one sample. Returns `None` when no worker is running or the
    /// query failed.
    pub async fn poll_once(&mut self) -> Option<BitrateReport> {
        let current = self.controller.handle().map(|h| h.generation);
        if current != self.generation {
            debug!(previous = ?self.generation, ?current, "Worker changed, resetting telemetry baseline");
            self.engine.reset();
            self.generation = current;
        }
        current?;

        match self.controller.statistics().await {
            Ok(stats) => {
                let snapshot = StatisticsSnapshot::from_statistics(&stats, Utc::now());
                Some(self.engine.ingest(snapshot))
            }
            Err(e) => {
                debug!(error = %e, "Statistics poll failed");
                None
            }
        }
    }

    /// Poll until cancelled, yielding every report.
    pub fn reports(mut self) -> impl Stream<Item = BitrateReport> {
        stream! {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let cancel_token = self.cancel_token.clone();

            debug!(interval = ?self.interval, "Starting telemetry poller");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Some(report) = self.poll_once().await {
                            yield report;
                        }
                    }
                    () = cancel_token.cancelled() => {
                        debug!("Telemetry poller cancelled");
                        break;
                    }
                }
            }
        }
    }
}
