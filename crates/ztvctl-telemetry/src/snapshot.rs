//! Immutable capture of the worker's cumulative counters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ztvctl_core::Statistics;

use crate::report::TunnelBitrate;

/// Cumulative byte counters of one channel, keyed by stream id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelCounters {
    pub inputs: BTreeMap<u32, u64>,
    pub outputs: BTreeMap<u32, u64>,
}

/// Counters as of `captured_at`.
///
/// Tunnels carry the worker's own rates rather than counters.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsSnapshot {
    pub captured_at: DateTime<Utc>,
    pub channels: BTreeMap<u32, ChannelCounters>,
    pub tunnels: BTreeMap<u32, TunnelBitrate>,
}

impl StatisticsSnapshot {
    pub const fn new(captured_at: DateTime<Utc>) -> Self {
        Self {
            captured_at,
            channels: BTreeMap::new(),
            tunnels: BTreeMap::new(),
        }
    }

    /// Extract byte counters from a `statistics` result.
    ///
    /// RIST and RTP families contribute; a stream present in both has its
    /// bytes summed. Other families are not counted.
    pub fn from_statistics(stats: &Statistics, captured_at: DateTime<Utc>) -> Self {
        let mut snapshot = Self::new(captured_at);

        for channel in &stats.channels {
            let counters = snapshot.channels.entry(channel.channel_id).or_default();
            let inputs = channel
                .rist_input
                .iter()
                .map(|s| (s.stream_id, s.bytes_received))
                .chain(
                    channel
                        .rtp_input
                        .iter()
                        .map(|s| (s.stream_id, s.bytes_received)),
                );
            for (stream_id, bytes) in inputs {
                *counters.inputs.entry(stream_id).or_default() += bytes;
            }

            let outputs = channel
                .rist_output
                .iter()
                .map(|s| (s.stream_id, s.bytes_sent))
                .chain(channel.rtp_output.iter().map(|s| (s.stream_id, s.bytes_sent)));
            for (stream_id, bytes) in outputs {
                *counters.outputs.entry(stream_id).or_default() += bytes;
            }
        }

        for tunnel in &stats.tunnels {
            snapshot.tunnels.insert(
                tunnel.tunnel_id,
                TunnelBitrate {
                    rx_bps: tunnel.rx_bits_per_second,
                    tx_bps: tunnel.tx_bits_per_second,
                },
            );
        }

        snapshot
    }

    #[must_use]
    pub fn with_input(mut self, channel_id: u32, stream_id: u32, bytes: u64) -> Self {
        self.channels
            .entry(channel_id)
            .or_default()
            .inputs
            .insert(stream_id, bytes);
        self
    }

    #[must_use]
    pub fn with_output(mut self, channel_id: u32, stream_id: u32, bytes: u64) -> Self {
        self.channels
            .entry(channel_id)
            .or_default()
            .outputs
            .insert(stream_id, bytes);
        self
    }

    #[must_use]
    pub fn with_tunnel(mut self, tunnel_id: u32, rx_bps: f64, tx_bps: f64) -> Self {
        self.tunnels
            .insert(tunnel_id, TunnelBitrate { rx_bps, tx_bps });
        self
    }
}
