//! Worker topology and telemetry domain types.
//!
//! These types mirror what the worker accepts and reports, independent of
//! how the worker is reached.
//!
//! # Design
//!
//! - `Channel` - Routing unit holding ordered input and output streams
//! - `InputStream` / `OutputStream` - Tagged stream variants
//! - `Tunnel` - Authenticated point-to-point transport
//! - `LogLevel` - Worker logging verbosity
//! - `Statistics` - Cumulative counters reported by the worker
//! - `SavedState` - Plain export/import structure for persistence collaborators

mod channel;
mod logging;
mod state;
mod statistics;
mod stream;
mod tunnel;

pub use channel::{Channel, ChannelParams};
pub use logging::{LogLevel, ParseLogLevelError};
pub use state::{SavedState, WorkerStatus};
pub use statistics::{
    ChannelStats, DeltaStatistics, RistInputStats, RistOutputStats, RtpInputStats,
    RtpOutputStats, SdiDevice, Statistics, TunnelRxStats, TunnelStats, TunnelTxStats,
};
pub use stream::{
    FromChannelInput, GeneratorInput, InputStream, InputStreamKind, OutputStream,
    OutputStreamKind, PacketFormat, RistInput, RistOutput, RtpGeneratorInput, RtpInput,
    RtpOutput, SdiInput, SdiOutput, UdpOutput,
};
pub use tunnel::{Tunnel, TunnelAuthentication, TunnelMode};
