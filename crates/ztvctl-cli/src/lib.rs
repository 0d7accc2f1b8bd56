#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the binary only
use dotenvy as _;

#[cfg(test)]
use tempfile as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod state_file;

pub use bootstrap::{CliConfig, CliContext, bootstrap, init_tracing};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
