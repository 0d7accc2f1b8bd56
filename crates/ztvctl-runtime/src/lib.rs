//! Worker process supervision for ztvctl.
//!
//! `WorkerController` owns the worker's lifecycle and an authoritative mirror
//! of its topology. `TelemetryPoller` periodically feeds the worker's
//! statistics into a telemetry engine.

#![deny(unsafe_code)]

pub mod controller;
mod error;
pub mod poller;
pub mod process;

pub use controller::WorkerController;
pub use error::{ControllerError, StreamDirection};
pub use poller::{MIN_POLL_INTERVAL, TelemetryPoller};
pub use process::{
    TracingEmitter, WorkerEventBroadcaster, WorkerHandle, WorkerState, force_kill,
};
pub use ztvctl_rpc::{RpcClient, RpcError};
