//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the controller and its event sinks
//! are wired together. Command handlers receive the composed `CliContext`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use ztvctl_core::{ControllerConfig, FanoutEmitter};
use ztvctl_runtime::{TracingEmitter, WorkerController, WorkerEventBroadcaster};

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Worker binary override (`--worker` / `ZTV_PATH`).
    pub worker_path: Option<PathBuf>,
    /// Statistics polling interval override.
    pub poll_interval: Option<Duration>,
}

impl CliConfig {
    /// Resolve into the controller configuration.
    pub fn controller_config(&self) -> ControllerConfig {
        let mut config = ControllerConfig::default();
        if let Some(path) = &self.worker_path {
            config = config.with_worker_path(path.clone());
        }
        if let Some(interval) = self.poll_interval {
            config = config.with_poll_interval(interval);
        }
        config
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    pub controller: Arc<WorkerController>,
    /// Lifecycle events, for handlers that react to worker exits.
    pub events: WorkerEventBroadcaster,
}

impl CliContext {
    pub fn config(&self) -> &ControllerConfig {
        self.controller.config()
    }
}

/// Build the controller with logging and broadcast event sinks.
pub fn bootstrap(config: &CliConfig) -> CliContext {
    let events = WorkerEventBroadcaster::new();
    let emitter = FanoutEmitter::new()
        .with(Arc::new(TracingEmitter))
        .with(Arc::new(events.clone()));

    let controller = WorkerController::new(config.controller_config(), Arc::new(emitter));
    CliContext {
        controller: Arc::new(controller),
        events,
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let config = CliConfig {
            worker_path: Some(PathBuf::from("/usr/local/bin/ztv")),
            poll_interval: Some(Duration::from_millis(500)),
        }
        .controller_config();
        assert_eq!(config.worker_path, PathBuf::from("/usr/local/bin/ztv"));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_defaults_without_overrides() {
        assert_eq!(CliConfig::default().controller_config(), ControllerConfig::default());
    }
}
