//! Derived bit rates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Rates of one channel. Stream maps are keyed by stream id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelBitrate {
    pub input_bps: f64,
    pub output_bps: f64,
    pub inputs: BTreeMap<u32, f64>,
    pub outputs: BTreeMap<u32, f64>,
}

/// Tunnel rates as computed by the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelBitrate {
    pub rx_bps: f64,
    pub tx_bps: f64,
}

/// Rates for every stream, channel and tunnel of one poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BitrateReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
    pub channels: BTreeMap<u32, ChannelBitrate>,
    pub tunnels: BTreeMap<u32, TunnelBitrate>,
    pub total_input_bps: f64,
    pub total_output_bps: f64,
}

impl BitrateReport {
    pub fn channel(&self, channel_id: u32) -> Option<&ChannelBitrate> {
        self.channels.get(&channel_id)
    }

    pub fn input(&self, channel_id: u32, stream_id: u32) -> Option<f64> {
        self.channel(channel_id)?.inputs.get(&stream_id).copied()
    }

    pub fn output(&self, channel_id: u32, stream_id: u32) -> Option<f64> {
        self.channel(channel_id)?.outputs.get(&stream_id).copied()
    }

    /// Recompute channel and system sums from the stream rates.
    pub(crate) fn aggregate(&mut self) {
        self.total_input_bps = 0.0;
        self.total_output_bps = 0.0;
        for channel in self.channels.values_mut() {
            channel.input_bps = channel.inputs.values().sum();
            channel.output_bps = channel.outputs.values().sum();
            self.total_input_bps += channel.input_bps;
            self.total_output_bps += channel.output_bps;
        }
    }
}
