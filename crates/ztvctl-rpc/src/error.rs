//! Transport error type.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during an RPC call.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Failed to communicate with worker: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A frame could not be decoded. Only surfaced for typed results; inbound
    /// garbage lines are logged and dropped by the read loop.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Request timeout: {method}")]
    Timeout { method: String },

    #[error("{code}: {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("Worker output stream closed")]
    StreamClosed,

    #[error("Client closed")]
    Closed,
}

impl RpcError {
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// True when the transport is gone and no further call can succeed.
    pub const fn is_disconnected(&self) -> bool {
        matches!(self, Self::StreamClosed | Self::Closed)
    }

    /// Worker-reported error code, if this is a remote error.
    pub const fn remote_code(&self) -> Option<i64> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }
}
