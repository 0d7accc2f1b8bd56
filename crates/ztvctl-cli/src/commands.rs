//! Subcommand definitions.

use std::path::PathBuf;

use clap::Subcommand;
use ztvctl_core::LogLevel;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the worker and keep it running until Ctrl-C
    ///
    /// The saved state file, if present, is replayed onto the worker at
    /// startup and rewritten from the live topology on exit.
    Run {
        /// Saved state file (JSON)
        #[arg(long, env = "ZTVCTL_STATE")]
        state: Option<PathBuf>,

        /// Statistics polling interval in milliseconds
        #[arg(long = "poll-ms", env = "ZTVCTL_POLL_MS", default_value_t = 2000)]
        poll_ms: u64,

        /// Worker logging level applied after startup
        #[arg(long = "worker-log-level")]
        worker_log_level: Option<LogLevel>,
    },

    /// Start the worker, query its status and stop it again
    Check,

    /// Parse a saved state file and print a summary
    ValidateState {
        /// Saved state file (JSON)
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use crate::parser::Cli;
    use clap::Parser;

    use super::*;

    #[test]
    fn test_run_parses_log_level() {
        let cli = Cli::parse_from(["ztvctl", "run", "--poll-ms", "500", "--worker-log-level", "warn"]);
        match cli.command {
            Some(Commands::Run {
                poll_ms,
                worker_log_level,
                ..
            }) => {
                assert_eq!(poll_ms, 500);
                assert_eq!(worker_log_level, Some(LogLevel::Warning));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_validate_state_takes_path() {
        let cli = Cli::parse_from(["ztvctl", "validate-state", "state.json"]);
        assert!(matches!(
            cli.command,
            Some(Commands::ValidateState { path }) if path == PathBuf::from("state.json")
        ));
    }
}
