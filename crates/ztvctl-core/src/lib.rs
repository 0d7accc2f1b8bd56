//! Core domain types and port definitions for ztvctl.
//!
//! This crate has no knowledge of processes or pipes. It defines the worker
//! topology (channels, streams, tunnels), the statistics DTOs the worker
//! reports, lifecycle events, and the controller configuration.

#![deny(unsafe_code)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    Channel, ChannelParams, ChannelStats, DeltaStatistics, FromChannelInput, GeneratorInput,
    InputStream, InputStreamKind, LogLevel, OutputStream, OutputStreamKind,
    ParseLogLevelError, PacketFormat, RistInput, RistInputStats, RistOutput, RistOutputStats,
    RtpGeneratorInput, RtpInput, RtpInputStats, RtpOutput, RtpOutputStats, SavedState,
    SdiDevice, SdiInput, SdiOutput, Statistics, Tunnel, TunnelAuthentication, TunnelMode,
    TunnelRxStats, TunnelStats, TunnelTxStats, UdpOutput, WorkerStatus,
};
pub use events::WorkerEvent;
pub use ports::{FanoutEmitter, NoopEmitter, WorkerEventEmitter};
pub use settings::{
    ControllerConfig, DEFAULT_KILL_GRACE, DEFAULT_POLL_INTERVAL, DEFAULT_RPC_TIMEOUT,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WORKER_PATH, WORKER_THREADS,
};
