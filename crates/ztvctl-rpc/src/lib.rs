//! Request/response transport for the worker control channel.
//!
//! Turns a bidirectional byte pipe (typically a child process's stdin and
//! stdout) into a concurrency-safe `call()` function. Requests and responses
//! are JSON-RPC 2.0 objects, one per line. Any number of calls may be
//! outstanding; responses are matched to callers by id in whatever order they
//! arrive.
//!
//! The client knows nothing about worker methods; see `ztvctl-runtime` for
//! the business layer.

#![deny(unsafe_code)]

mod client;
mod error;
mod wire;

pub use client::{DEFAULT_TIMEOUT, RpcClient};
pub use error::RpcError;
pub use wire::{JSONRPC_VERSION, RpcErrorObject, RpcRequest, RpcResponse};
