//! Port definitions (trait abstractions) for collaborators.
//!
//! Ports contain no implementation details and use only domain types.

pub mod event_emitter;

pub use event_emitter::{FanoutEmitter, NoopEmitter, WorkerEventEmitter};
