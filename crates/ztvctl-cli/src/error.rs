//! CLI-specific error types and exit code mapping.

use thiserror::Error;
use ztvctl_runtime::ControllerError;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// The worker rejected a request or failed to answer.
    #[error("Worker error: {0}")]
    Worker(String),

    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Saved state is malformed or inconsistent.
    #[error("Invalid state: {0}")]
    State(String),

    /// The worker process could not be started or exited unexpectedly.
    #[error("Process error: {0}")]
    Process(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Worker(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::State(_) => 65,    // EX_DATAERR
            Self::Process(_) => 71,  // EX_OSERR
            Self::Io(_) => 74,       // EX_IOERR
        }
    }
}

impl From<ControllerError> for CliError {
    fn from(err: ControllerError) -> Self {
        if err.is_lifecycle() {
            Self::Process(err.to_string())
        } else if err.is_state() {
            Self::State(err.to_string())
        } else {
            Self::Worker(err.to_string())
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Exit code for an error returned from a handler.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}
