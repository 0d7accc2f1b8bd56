//! Worker lifecycle events.
//!
//! Events are serialized with a `type` tag so adapters can forward them to
//! SSE or websocket clients unchanged:
//!
//! ```json
//! { "type": "stopped", "code": 0 }
//! ```

use serde::{Deserialize, Serialize};

/// Lifecycle event emitted by the worker controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerEvent {
    /// A worker process was spawned and its transport attached.
    Started {
        #[serde(skip_serializing_if = "Option::is_none")]
        pid: Option<u32>,
    },

    /// The tracked worker process exited (or was stopped).
    Stopped {
        /// Exit code, `None` if terminated by a signal or not observed.
        code: Option<i32>,
    },

    /// Starting the worker failed.
    Error { message: String },

    /// A restart was requested; `Stopped` and `Started` follow.
    Restarting,
}

impl WorkerEvent {
    pub const fn started(pid: Option<u32>) -> Self {
        Self::Started { pid }
    }

    pub const fn stopped(code: Option<i32>) -> Self {
        Self::Stopped { code }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Short name matching the serialized `type` tag.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Stopped { .. } => "stopped",
            Self::Error { .. } => "error",
            Self::Restarting => "restarting",
        }
    }
}
