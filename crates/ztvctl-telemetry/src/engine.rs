//! Bit-rate derivation from consecutive snapshots.

use std::collections::BTreeMap;

use tracing::debug;

use crate::report::{BitrateReport, ChannelBitrate};
use crate::snapshot::StatisticsSnapshot;

/// Turns cumulative counters into rates, one snapshot at a time.
///
/// Exactly one previous snapshot is kept as the baseline. Rates are
/// `max(0, Δbytes × 8 / Δseconds)`; a stream missing from the baseline is a
/// first sample and reports 0.
#[derive(Debug, Default)]
pub struct TelemetryEngine {
    previous: Option<StatisticsSnapshot>,
    last_report: BitrateReport,
}

impl TelemetryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute a report for `snapshot` and make it the new baseline.
    ///
    /// If no time has passed since the baseline, the previous report is
    /// returned and the baseline is kept.
    pub fn ingest(&mut self, snapshot: StatisticsSnapshot) -> BitrateReport {
        let elapsed_secs = match &self.previous {
            None => None,
            Some(previous) => {
                let elapsed = snapshot.captured_at - previous.captured_at;
                let Some(micros) = elapsed.num_microseconds().filter(|&us| us > 0) else {
                    debug!(
                        elapsed_ms = elapsed.num_milliseconds(),
                        "Snapshot not newer than baseline, keeping previous rates"
                    );
                    return self.last_report.clone();
                };
                #[allow(clippy::cast_precision_loss)]
                let secs = micros as f64 / 1_000_000.0;
                Some(secs)
            }
        };

        let mut report = BitrateReport {
            captured_at: Some(snapshot.captured_at),
            tunnels: snapshot.tunnels.clone(),
            ..BitrateReport::default()
        };

        for (&channel_id, counters) in &snapshot.channels {
            let baseline = self
                .previous
                .as_ref()
                .and_then(|previous| previous.channels.get(&channel_id));
            let channel = ChannelBitrate {
                inputs: rates(
                    &counters.inputs,
                    baseline.map(|b| &b.inputs),
                    elapsed_secs,
                ),
                outputs: rates(
                    &counters.outputs,
                    baseline.map(|b| &b.outputs),
                    elapsed_secs,
                ),
                ..ChannelBitrate::default()
            };
            report.channels.insert(channel_id, channel);
        }
        report.aggregate();

        self.previous = Some(snapshot);
        self.last_report = report.clone();
        report
    }

    /// Forget the baseline; the next snapshot is a first sample again.
    pub fn reset(&mut self) {
        self.previous = None;
        self.last_report = BitrateReport::default();
    }

    pub const fn baseline(&self) -> Option<&StatisticsSnapshot> {
        self.previous.as_ref()
    }

    pub const fn last_report(&self) -> &BitrateReport {
        &self.last_report
    }
}

fn rates(
    current: &BTreeMap<u32, u64>,
    previous: Option<&BTreeMap<u32, u64>>,
    elapsed_secs: Option<f64>,
) -> BTreeMap<u32, f64> {
    current
        .iter()
        .map(|(&stream_id, &bytes)| {
            let before = previous.and_then(|p| p.get(&stream_id)).copied();
            (stream_id, rate(bytes, before, elapsed_secs))
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn rate(current: u64, previous: Option<u64>, elapsed_secs: Option<f64>) -> f64 {
    match (previous, elapsed_secs) {
        // A counter that went backwards was reset by the worker.
        (Some(before), Some(secs)) if current >= before => (current - before) as f64 * 8.0 / secs,
        _ => 0.0,
    }
}
