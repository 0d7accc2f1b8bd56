//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Supervise a ztv worker process.
#[derive(Parser)]
#[command(name = "ztvctl")]
#[command(about = "Supervise a ztv media transport worker")]
#[command(version)]
pub struct Cli {
    /// Path to the worker binary
    #[arg(long = "worker", env = "ZTV_PATH", global = true)]
    pub worker: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
