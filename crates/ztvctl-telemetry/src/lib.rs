//! Telemetry for ztvctl.
//!
//! The worker reports cumulative byte counters. [`TelemetryEngine`] keeps one
//! previous [`StatisticsSnapshot`] and turns each new one into a
//! [`BitrateReport`] of per-stream, per-channel and system bit rates.

#![deny(unsafe_code)]

mod engine;
mod format;
mod report;
mod snapshot;

pub use engine::TelemetryEngine;
pub use format::format_bitrate;
pub use report::{BitrateReport, ChannelBitrate, TunnelBitrate};
pub use snapshot::{ChannelCounters, StatisticsSnapshot};
