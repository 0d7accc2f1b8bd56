//! Plain state structures exchanged with collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::channel::Channel;
use super::logging::LogLevel;
use super::tunnel::Tunnel;

/// Exportable topology: everything needed to rebuild a worker's configuration.
///
/// Persistence collaborators store this verbatim. `logging_level` is optional
/// on import so that older files without it still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub tunnels: Vec<Tunnel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging_level: Option<LogLevel>,
}

impl SavedState {
    /// Total number of streams across all channels.
    pub fn stream_count(&self) -> usize {
        self.channels
            .iter()
            .map(|c| c.inputs.len() + c.outputs.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.tunnels.is_empty()
    }
}

/// Worker process status as seen by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}
