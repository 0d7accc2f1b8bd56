//! Statistics reported by the worker.
//!
//! Counters are cumulative since the stream was created. Every field is
//! defaulted so that a worker omitting a family (or a whole section) still
//! parses; the telemetry engine only needs the byte counters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// RIST receive counters for one stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RistInputStats {
    pub stream_id: u32,
    pub packets_received: u64,
    pub bytes_received: u64,
    pub retransmit_packets_received: u64,
    pub retransmit_bytes_received: u64,
    pub packets_lost: u64,
    pub packets_discarded: u64,
    pub packets_dropped: u64,
    pub interarrival_jitter: f64,
    pub roundtrip_ms: f64,
    pub propagation_delay_ms: f64,
}

/// RIST transmit counters for one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RistOutputStats {
    pub stream_id: u32,
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub retransmit_packets_sent: u64,
    pub retransmit_bytes_sent: u64,
}

/// RTP receive counters for one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RtpInputStats {
    pub stream_id: u32,
    pub packets_received: u64,
    pub bytes_received: u64,
    pub packets_lost: u64,
}

/// RTP transmit counters for one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RtpOutputStats {
    pub stream_id: u32,
    pub packets_sent: u64,
    pub bytes_sent: u64,
}

/// Per-channel counters, grouped by stream family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelStats {
    pub channel_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retransmit_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retransmit_roundtrip_ms: Option<u64>,
    pub rist_input: Vec<RistInputStats>,
    pub rist_output: Vec<RistOutputStats>,
    pub rtp_input: Vec<RtpInputStats>,
    pub rtp_output: Vec<RtpOutputStats>,
    pub udp_input: Vec<Value>,
    pub udp_output: Vec<Value>,
    pub unix_input: Vec<Value>,
    pub unix_output: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TunnelRxStats {
    pub packets: u64,
    pub bytes: u64,
    pub fragments: u64,
    pub keep_alive_packets: u64,
    pub bad_address: u64,
    pub buffer_full: u64,
    pub crypto_failure: u64,
    pub socket_error: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TunnelTxStats {
    pub packets: u64,
    pub bytes: u64,
    pub not_connected: u64,
    pub configuration_error: u64,
    pub socket_error: u64,
}

/// Per-tunnel counters. Unlike streams, the worker computes tunnel rates itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TunnelStats {
    pub tunnel_id: u32,
    pub remote_endpoint: String,
    pub status: String,
    pub rx_bits_per_second: f64,
    pub tx_bits_per_second: f64,
    pub rx: TunnelRxStats,
    pub tx: TunnelTxStats,
}

/// Result of the worker's `statistics` method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Statistics {
    pub deadlines_missed: u64,
    pub channels: Vec<ChannelStats>,
    pub tunnels: Vec<TunnelStats>,
}

/// Result of the worker's `deltaStatistics` method (timing since last query).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeltaStatistics {
    pub longest_work_time_per_thread: Vec<f64>,
    pub max_delayed_timer_per_thread: Vec<f64>,
    pub age_of_oldest_reorder_hole: f64,
    pub max_reorder_time_per_channel: Vec<f64>,
}

/// A hardware capture/playout device known to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdiDevice {
    pub index: u32,
    pub name: String,
    #[serde(default)]
    pub display_modes: Vec<String>,
}
