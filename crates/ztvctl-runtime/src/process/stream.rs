//! Async stream log reader (non-UTF8-safe).
//!
//! The worker can emit non-UTF8 bytes on stderr. `BufReader::lines()` would
//! terminate on invalid UTF-8, so lines are read as bytes and decoded lossily.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

pub(crate) fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    pid: Option<u32>,
    stream_type: &'static str,
) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    while matches!(buf.last(), Some(b'\n' | b'\r')) {
                        buf.pop();
                    }
                    let line = String::from_utf8_lossy(&buf);
                    debug!(?pid, %stream_type, "[ztv] {line}");
                }
                Err(e) => {
                    debug!(?pid, %stream_type, error = %e, "log stream reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(?pid, %stream_type, "log stream reader task exiting");
    });
}
