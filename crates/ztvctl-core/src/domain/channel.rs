//! Channel types.

use serde::{Deserialize, Serialize};

use super::stream::{InputStream, OutputStream};

/// Parameters for creating a channel on the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelParams {
    pub channel_id: u32,
    #[serde(default)]
    pub description: String,
    pub buffer_duration_ms: u32,
}

/// A channel as held in the mirror: creation parameters plus its streams in
/// the order they were confirmed by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub channel_id: u32,
    #[serde(default)]
    pub description: String,
    pub buffer_duration_ms: u32,
    #[serde(default)]
    pub inputs: Vec<InputStream>,
    #[serde(default)]
    pub outputs: Vec<OutputStream>,
}

impl Channel {
    /// Create an empty channel from its creation parameters.
    pub fn new(params: ChannelParams) -> Self {
        Self {
            channel_id: params.channel_id,
            description: params.description,
            buffer_duration_ms: params.buffer_duration_ms,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Creation parameters without the streams.
    pub fn params(&self) -> ChannelParams {
        ChannelParams {
            channel_id: self.channel_id,
            description: self.description.clone(),
            buffer_duration_ms: self.buffer_duration_ms,
        }
    }

    pub fn input(&self, stream_id: u32) -> Option<&InputStream> {
        self.inputs.iter().find(|s| s.stream_id() == stream_id)
    }

    pub fn output(&self, stream_id: u32) -> Option<&OutputStream> {
        self.outputs.iter().find(|s| s.stream_id() == stream_id)
    }
}
