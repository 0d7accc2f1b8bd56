//! Input and output stream variants.
//!
//! Every stream belongs to exactly one channel and carries a `stream_id`
//! unique within that channel and direction. The wire representation is an
//! internally tagged object (`{"type": "rtp", "channelId": 1, ...}`) so that
//! saved state files round-trip through the same types the worker accepts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Network receive (plain RTP, optionally multicast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpInput {
    pub channel_id: u32,
    pub stream_id: u32,
    pub local_ip: String,
    pub local_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multicast_address: Option<String>,
    #[serde(default)]
    pub use_fec: bool,
}

/// Tunnel-carried receive. The tunnel must be configured before the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RistInput {
    pub channel_id: u32,
    pub stream_id: u32,
    pub tunnel_id: u32,
    pub local_ip: String,
    pub local_port: u16,
    #[serde(default)]
    pub use_fec: bool,
}

/// Transport stream pattern generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpGeneratorInput {
    pub channel_id: u32,
    pub stream_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_bitrate_bps: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet_size_bytes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_psi: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmt_pid: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_pid: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psi_interval_packets: Option<u32>,
}

/// Relay of another channel's output into this channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FromChannelInput {
    pub channel_id: u32,
    pub stream_id: u32,
    pub source_channel_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid_remap: Option<bool>,
}

/// Hardware capture (SDI card) encoded into a transport stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdiInput {
    pub channel_id: u32,
    pub stream_id: u32,
    pub device_index: u32,
    pub display_mode: String,
    pub bitrate: u64,
    pub keyframe_interval: u32,
}

/// Synthetic video generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorInput {
    pub channel_id: u32,
    pub stream_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps_num: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps_den: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyframe_interval: Option<u32>,
}

/// An input leg of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputStream {
    Rtp(RtpInput),
    Rist(RistInput),
    RtpGenerator(RtpGeneratorInput),
    FromChannel(FromChannelInput),
    Sdi(SdiInput),
    Generator(GeneratorInput),
}

/// Discriminant of [`InputStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputStreamKind {
    Rtp,
    Rist,
    RtpGenerator,
    FromChannel,
    Sdi,
    Generator,
}

impl InputStream {
    pub const fn kind(&self) -> InputStreamKind {
        match self {
            Self::Rtp(_) => InputStreamKind::Rtp,
            Self::Rist(_) => InputStreamKind::Rist,
            Self::RtpGenerator(_) => InputStreamKind::RtpGenerator,
            Self::FromChannel(_) => InputStreamKind::FromChannel,
            Self::Sdi(_) => InputStreamKind::Sdi,
            Self::Generator(_) => InputStreamKind::Generator,
        }
    }

    pub const fn channel_id(&self) -> u32 {
        match self {
            Self::Rtp(s) => s.channel_id,
            Self::Rist(s) => s.channel_id,
            Self::RtpGenerator(s) => s.channel_id,
            Self::FromChannel(s) => s.channel_id,
            Self::Sdi(s) => s.channel_id,
            Self::Generator(s) => s.channel_id,
        }
    }

    pub const fn stream_id(&self) -> u32 {
        match self {
            Self::Rtp(s) => s.stream_id,
            Self::Rist(s) => s.stream_id,
            Self::RtpGenerator(s) => s.stream_id,
            Self::FromChannel(s) => s.stream_id,
            Self::Sdi(s) => s.stream_id,
            Self::Generator(s) => s.stream_id,
        }
    }

    /// Re-home the stream onto `channel_id`.
    pub const fn set_channel_id(&mut self, channel_id: u32) {
        match self {
            Self::Rtp(s) => s.channel_id = channel_id,
            Self::Rist(s) => s.channel_id = channel_id,
            Self::RtpGenerator(s) => s.channel_id = channel_id,
            Self::FromChannel(s) => s.channel_id = channel_id,
            Self::Sdi(s) => s.channel_id = channel_id,
            Self::Generator(s) => s.channel_id = channel_id,
        }
    }

    /// Tunnel this stream is carried over, if any.
    pub const fn tunnel_id(&self) -> Option<u32> {
        match self {
            Self::Rist(s) => Some(s.tunnel_id),
            _ => None,
        }
    }
}

impl fmt::Display for InputStreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rtp => "rtp",
            Self::Rist => "rist",
            Self::RtpGenerator => "rtp_generator",
            Self::FromChannel => "from_channel",
            Self::Sdi => "sdi",
            Self::Generator => "generator",
        };
        f.write_str(s)
    }
}

/// Network transmit (RTP).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpOutput {
    pub channel_id: u32,
    pub stream_id: u32,
    pub local_ip: String,
    pub local_port: u16,
    pub remote_ip: String,
    pub remote_port: u16,
    #[serde(default)]
    pub delay_ms: u32,
}

/// Tunnel-carried (or direct RIST) transmit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RistOutput {
    pub channel_id: u32,
    pub stream_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tunnel_id: Option<u32>,
    pub local_ip: String,
    pub local_port: u16,
    pub remote_ip: String,
    pub remote_port: u16,
    #[serde(default)]
    pub use_origin_timing: bool,
}

/// Payload framing for raw UDP transmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketFormat {
    #[default]
    Ts,
    Rtp,
}

/// Raw UDP transmit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UdpOutput {
    pub channel_id: u32,
    pub stream_id: u32,
    pub local_ip: String,
    pub local_port: u16,
    pub remote_ip: String,
    pub remote_port: u16,
    #[serde(default)]
    pub delay_ms: u32,
    #[serde(default)]
    pub packet_format: PacketFormat,
}

/// Hardware playout (SDI card).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdiOutput {
    pub channel_id: u32,
    pub stream_id: u32,
    pub device_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_index: Option<u32>,
    pub video_mode: String,
    pub pixel_format: String,
}

/// An output leg of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputStream {
    Rtp(RtpOutput),
    Rist(RistOutput),
    Udp(UdpOutput),
    Sdi(SdiOutput),
}

/// Discriminant of [`OutputStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStreamKind {
    Rtp,
    Rist,
    Udp,
    Sdi,
}

impl OutputStream {
    pub const fn kind(&self) -> OutputStreamKind {
        match self {
            Self::Rtp(_) => OutputStreamKind::Rtp,
            Self::Rist(_) => OutputStreamKind::Rist,
            Self::Udp(_) => OutputStreamKind::Udp,
            Self::Sdi(_) => OutputStreamKind::Sdi,
        }
    }

    pub const fn channel_id(&self) -> u32 {
        match self {
            Self::Rtp(s) => s.channel_id,
            Self::Rist(s) => s.channel_id,
            Self::Udp(s) => s.channel_id,
            Self::Sdi(s) => s.channel_id,
        }
    }

    pub const fn stream_id(&self) -> u32 {
        match self {
            Self::Rtp(s) => s.stream_id,
            Self::Rist(s) => s.stream_id,
            Self::Udp(s) => s.stream_id,
            Self::Sdi(s) => s.stream_id,
        }
    }

    /// Re-home the stream onto `channel_id`.
    pub const fn set_channel_id(&mut self, channel_id: u32) {
        match self {
            Self::Rtp(s) => s.channel_id = channel_id,
            Self::Rist(s) => s.channel_id = channel_id,
            Self::Udp(s) => s.channel_id = channel_id,
            Self::Sdi(s) => s.channel_id = channel_id,
        }
    }

    pub const fn tunnel_id(&self) -> Option<u32> {
        match self {
            Self::Rist(s) => s.tunnel_id,
            _ => None,
        }
    }
}

impl fmt::Display for OutputStreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rtp => "rtp",
            Self::Rist => "rist",
            Self::Udp => "udp",
            Self::Sdi => "sdi",
        };
        f.write_str(s)
    }
}
