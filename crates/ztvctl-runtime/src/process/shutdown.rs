//! Forced termination for `tokio::process::Child`.

use std::io;
use std::process::ExitStatus;

use tokio::process::Child;

/// Kill a child process and wait for it to be reaped.
///
/// If the child already exited, its recorded status is returned.
pub async fn force_kill(child: &mut Child) -> io::Result<ExitStatus> {
    if let Err(e) = child.start_kill() {
        // Already reaped; `wait` returns the cached status.
        if e.kind() != io::ErrorKind::InvalidInput {
            return Err(e);
        }
    }
    child.wait().await
}
