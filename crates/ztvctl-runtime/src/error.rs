//! Controller error type.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use ztvctl_rpc::RpcError;

/// Direction of a stream within a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirection {
    Input,
    Output,
}

impl fmt::Display for StreamDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("Input"),
            Self::Output => f.write_str("Output"),
        }
    }
}

/// Errors that can occur during worker controller operations.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Worker process is already running")]
    AlreadyRunning,

    #[error("Worker process is not running")]
    NotRunning,

    #[error("Failed to spawn worker '{}': {source}", path.display())]
    SpawnFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Worker process has no {0} pipe")]
    MissingPipe(&'static str),

    #[error("Channel {0} not found")]
    ChannelNotFound(u32),

    #[error("Channel {0} already exists")]
    ChannelExists(u32),

    #[error("Tunnel {0} not found")]
    TunnelNotFound(u32),

    #[error("Tunnel {0} already exists")]
    TunnelExists(u32),

    #[error("{direction} stream {stream_id} not found on channel {channel_id}")]
    StreamNotFound {
        channel_id: u32,
        stream_id: u32,
        direction: StreamDirection,
    },

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ControllerError {
    /// Lifecycle misuse: wrong process state for the operation.
    pub const fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRunning | Self::NotRunning | Self::SpawnFailed { .. } | Self::MissingPipe(_)
        )
    }

    /// The operation referenced an id the mirror does (or does not) hold.
    /// No remote call was made.
    pub const fn is_state(&self) -> bool {
        matches!(
            self,
            Self::ChannelNotFound(_)
                | Self::ChannelExists(_)
                | Self::TunnelNotFound(_)
                | Self::TunnelExists(_)
                | Self::StreamNotFound { .. }
        )
    }

    /// The worker itself rejected the call.
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Rpc(RpcError::Remote { .. }))
    }
}
