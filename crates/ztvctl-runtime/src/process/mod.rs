//! Process-level infrastructure for the worker.
//!
//! - `WorkerHandle` / `WorkerState` - Identity and lifecycle state
//! - `WorkerEventBroadcaster` / `TracingEmitter` - Lifecycle event sinks
//! - `force_kill` - Forced termination with reaping
//! - `spawn_stream_reader` - Lossy line reader for the worker's stderr

mod broadcaster;
mod shutdown;
mod stream;
mod types;

pub use broadcaster::{TracingEmitter, WorkerEventBroadcaster};
pub use shutdown::force_kill;
pub(crate) use stream::spawn_stream_reader;
pub(crate) use types::ExitReport;
pub use types::{WorkerHandle, WorkerState};
