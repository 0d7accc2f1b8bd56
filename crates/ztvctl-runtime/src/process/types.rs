//! Shared types for worker process management.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identity of one spawned (or attached) worker.
///
/// `generation` increases with every start, so an exit notification can be
/// matched against the handle that is current when it arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerHandle {
    pub generation: u64,
    /// `None` for transports attached without a process.
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
}

impl WorkerHandle {
    pub fn new(generation: u64, pid: Option<u32>) -> Self {
        Self {
            generation,
            pid,
            started_at: Utc::now(),
        }
    }
}

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Exit observed by the exit watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExitReport {
    pub code: Option<i32>,
}
