//! Controller configuration.
//!
//! Pure data with defaults; adapters fill it from flags, environment or a
//! settings store.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Worker binary used when nothing else is configured.
pub const DEFAULT_WORKER_PATH: &str = "./ztv";

/// Worker thread count passed as `--workers`.
///
/// Fixed at one: tunnels and the channels whose streams reference them must
/// run on the same worker thread for tunnel-carried input to function.
pub const WORKER_THREADS: u32 = 1;

/// Default bound on a single request/response round trip.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on the graceful `shutdown` call.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time to wait for exit after a successful `shutdown` before killing.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(5);

/// Default telemetry polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Configuration for the worker controller and telemetry poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Path to the worker binary.
    pub worker_path: PathBuf,

    /// Bound on each RPC call.
    #[serde(with = "duration_ms")]
    pub rpc_timeout: Duration,

    /// Bound on the graceful shutdown call.
    #[serde(with = "duration_ms")]
    pub shutdown_timeout: Duration,

    /// Wait for exit after graceful shutdown before force-killing.
    #[serde(with = "duration_ms")]
    pub kill_grace: Duration,

    /// Telemetry polling interval.
    #[serde(with = "duration_ms")]
    pub poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            worker_path: PathBuf::from(DEFAULT_WORKER_PATH),
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            kill_grace: DEFAULT_KILL_GRACE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ControllerConfig {
    #[must_use]
    pub fn with_worker_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.worker_path = path.into();
        self
    }

    #[must_use]
    pub const fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Arguments the worker is always spawned with.
    pub fn worker_args() -> Vec<String> {
        vec!["--workers".to_string(), WORKER_THREADS.to_string()]
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
