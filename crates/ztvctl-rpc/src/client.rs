//! Multiplexing JSON-RPC client.
//!
//! Each `call()` registers a pending entry keyed by a fresh id, hands one
//! request line to the writer task and waits on a oneshot channel. A single
//! reader task decodes inbound lines and completes whichever pending entry
//! matches. Every entry is resolved exactly once: by its response, its
//! timeout, stream termination or `close()`, whichever comes first. Later
//! arrivals for the same id find no entry and are discarded.
//!
//! The deadline covers the whole call, including handing the request to the
//! worker. Frames are written whole by the writer task even when the caller
//! gives up midway.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::RpcError;
use crate::wire::{RpcRequest, RpcResponse};

/// Default bound on a single call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Requests queued for the writer task before callers wait for room.
const OUTBOUND_CAPACITY: usize = 64;

const LINE_CAPACITY: usize = 8 * 1024;

type Outcome = Result<Value, RpcError>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    StreamClosed,
    Closed,
}

impl CloseReason {
    const fn error(self) -> RpcError {
        match self {
            Self::StreamClosed => RpcError::StreamClosed,
            Self::Closed => RpcError::Closed,
        }
    }
}

struct PendingCall {
    method: String,
    sender: oneshot::Sender<Outcome>,
}

#[derive(Default)]
struct PendingTable {
    calls: HashMap<u64, PendingCall>,
    closed: Option<CloseReason>,
}

/// State shared between callers and the reader task.
#[derive(Default)]
struct Shared {
    table: Mutex<PendingTable>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PendingTable> {
        lock(&self.table)
    }

    fn register(
        &self,
        id: u64,
        method: &str,
        sender: oneshot::Sender<Outcome>,
    ) -> Result<(), RpcError> {
        let mut table = self.lock();
        if let Some(reason) = table.closed {
            return Err(reason.error());
        }
        table.calls.insert(
            id,
            PendingCall {
                method: method.to_string(),
                sender,
            },
        );
        Ok(())
    }

    fn remove(&self, id: u64) -> Option<PendingCall> {
        self.lock().calls.remove(&id)
    }

    fn dispatch(&self, response: RpcResponse) {
        let Some(id) = response.id else {
            warn!("Received response without id");
            return;
        };
        let Some(call) = self.remove(id) else {
            warn!(id, "Received response for unknown request");
            return;
        };
        debug!(id, method = %call.method, "Received response");
        // The caller may have given up (future dropped); nothing to do then.
        let _ = call.sender.send(response.into_outcome());
    }

    /// Reject every pending call and refuse new ones. Returns how many calls
    /// were rejected.
    fn fail_all(&self, reason: CloseReason) -> usize {
        let calls = {
            let mut table = self.lock();
            if reason == CloseReason::Closed || table.closed.is_none() {
                table.closed = Some(reason);
            }
            std::mem::take(&mut table.calls)
        };

        let count = calls.len();
        for (_, call) in calls {
            let _ = call.sender.send(Err(reason.error()));
        }
        count
    }
}

/// Removes a pending entry when the calling future finishes or is dropped.
struct PendingGuard<'a> {
    shared: &'a Shared,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.shared.remove(self.id);
    }
}

/// One request line for the writer task.
struct Frame {
    line: Vec<u8>,
    written: oneshot::Sender<io::Result<()>>,
}

/// Handle on the writer task.
struct Writer {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// JSON-RPC client over an arbitrary byte pipe.
///
/// Requires a Tokio runtime: construction spawns the reader and writer tasks.
pub struct RpcClient {
    shared: Arc<Shared>,
    frames: mpsc::Sender<Frame>,
    writer: Mutex<Option<Writer>>,
    next_id: AtomicU64,
    timeout: Duration,
    reader: JoinHandle<()>,
}

impl RpcClient {
    /// Create a client writing requests to `sink` and reading responses from
    /// `source`, using [`DEFAULT_TIMEOUT`].
    pub fn new<W, R>(sink: W, source: R) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self::with_timeout(sink, source, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom per-call timeout.
    pub fn with_timeout<W, R>(sink: W, source: R, call_timeout: Duration) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncRead + Send + Unpin + 'static,
    {
        let shared = Arc::new(Shared::default());
        let reader = tokio::spawn(read_loop(Arc::clone(&shared), source));

        let (frames, queue) = mpsc::channel(OUTBOUND_CAPACITY);
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(write_loop(sink, queue, stopped));

        Self {
            shared,
            frames,
            writer: Mutex::new(Some(Writer { stop, task })),
            next_id: AtomicU64::new(1),
            timeout: call_timeout,
            reader,
        }
    }

    /// Send a request and wait for its response.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let line = RpcRequest::new(id, method, params).to_line()?;

        let (sender, mut receiver) = oneshot::channel();
        self.shared.register(id, method, sender)?;
        let _guard = PendingGuard {
            shared: &self.shared,
            id,
        };

        let exchanged = timeout(self.timeout, self.exchange(id, method, line, &mut receiver)).await;
        match exchanged {
            Ok(outcome) => outcome,
            Err(_) => {
                if self.shared.remove(id).is_some() {
                    warn!(id, method, "Request timed out");
                    Err(RpcError::Timeout {
                        method: method.to_string(),
                    })
                } else {
                    // Completed between the deadline firing and removal.
                    receiver.try_recv().unwrap_or_else(|_| {
                        Err(RpcError::Timeout {
                            method: method.to_string(),
                        })
                    })
                }
            }
        }
    }

    async fn exchange(
        &self,
        id: u64,
        method: &str,
        line: Vec<u8>,
        receiver: &mut oneshot::Receiver<Outcome>,
    ) -> Outcome {
        let (written, write_result) = oneshot::channel();
        self.frames
            .send(Frame { line, written })
            .await
            .map_err(|_| RpcError::Closed)?;
        write_result.await.map_err(|_| RpcError::Closed)??;
        debug!(id, method, "Sent request");

        receiver.await.unwrap_or(Err(RpcError::Closed))
    }

    /// Send a request and deserialize its result.
    pub async fn call_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value)
            .map_err(|e| RpcError::Protocol(format!("Unexpected result for {method}: {e}")))
    }

    /// Reject all pending calls with [`RpcError::Closed`] and end the
    /// outbound sink. Later calls fail immediately. Idempotent.
    pub async fn close(&self) {
        let rejected = self.shared.fail_all(CloseReason::Closed);
        if rejected > 0 {
            debug!(rejected, "Rejected pending requests on close");
        }

        let writer = lock(&self.writer).take();
        if let Some(writer) = writer {
            let _ = writer.stop.send(());
            if let Err(e) = writer.task.await {
                debug!(error = %e, "Request writer task failed");
            }
        }
    }

    /// Number of calls awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.shared.lock().calls.len()
    }

    /// True once `close()` was called or the inbound stream ended.
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed.is_some()
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.reader.abort();
        self.shared.fail_all(CloseReason::Closed);
        if let Some(writer) = lock(&self.writer).take() {
            let _ = writer.stop.send(());
        }
    }
}

/// Writes queued frames one at a time until stopped.
///
/// A frame is only abandoned halfway when the client is closing.
async fn write_loop<W>(
    mut sink: W,
    mut frames: mpsc::Receiver<Frame>,
    mut stop: oneshot::Receiver<()>,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        let frame = tokio::select! {
            _ = &mut stop => break,
            frame = frames.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        let result = tokio::select! {
            _ = &mut stop => break,
            result = write_frame(&mut sink, &frame.line) => result,
        };
        if let Err(e) = &result {
            warn!(error = %e, "Failed to write request");
        }
        let _ = frame.written.send(result);
    }

    if let Err(e) = sink.shutdown().await {
        debug!(error = %e, "Error shutting down request sink");
    }
}

async fn write_frame<W>(sink: &mut W, line: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    sink.write_all(line).await?;
    sink.flush().await
}

async fn read_loop<R>(shared: Arc<Shared>, source: R)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(source);
    let mut line: Vec<u8> = Vec::with_capacity(LINE_CAPACITY);

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => {
                debug!("Worker output stream ended");
                break;
            }
            Ok(_) => {
                if line.pop() != Some(b'\n') {
                    debug!(bytes = line.len() + 1, "Discarding unterminated trailing fragment");
                    continue;
                }
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                handle_line(&shared, &line);
            }
            Err(e) => {
                warn!(error = %e, "Error reading worker output");
                break;
            }
        }
    }

    let rejected = shared.fail_all(CloseReason::StreamClosed);
    if rejected > 0 {
        warn!(rejected, "Rejected pending requests after stream closed");
    }
}

fn handle_line(shared: &Shared, line: &[u8]) {
    if line.iter().all(u8::is_ascii_whitespace) {
        return;
    }

    match serde_json::from_slice::<RpcResponse>(line) {
        Ok(response) => shared.dispatch(response),
        Err(e) => warn!(
            error = %e,
            line = %String::from_utf8_lossy(line),
            "Failed to parse JSON-RPC response"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fail_all_rejects_each_call_once() {
        let shared = Shared::default();
        let mut receivers = Vec::new();
        for id in 1..=3 {
            let (tx, rx) = oneshot::channel();
            shared.register(id, "statistics", tx).unwrap();
            receivers.push(rx);
        }

        assert_eq!(shared.fail_all(CloseReason::StreamClosed), 3);
        assert_eq!(shared.fail_all(CloseReason::StreamClosed), 0);

        for mut rx in receivers {
            assert!(matches!(rx.try_recv(), Ok(Err(RpcError::StreamClosed))));
        }
    }

    #[test]
    fn test_register_after_close_fails() {
        let shared = Shared::default();
        shared.fail_all(CloseReason::Closed);
        let (tx, _rx) = oneshot::channel();
        assert!(matches!(
            shared.register(1, "status", tx),
            Err(RpcError::Closed)
        ));
    }

    #[test]
    fn test_close_overrides_stream_closed_reason() {
        let shared = Shared::default();
        shared.fail_all(CloseReason::StreamClosed);
        shared.fail_all(CloseReason::Closed);
        assert_eq!(shared.lock().closed, Some(CloseReason::Closed));
    }

    #[test]
    fn test_dispatch_unknown_id_is_ignored() {
        let shared = Shared::default();
        let (tx, mut rx) = oneshot::channel();
        shared.register(1, "status", tx).unwrap();

        let response: RpcResponse = serde_json::from_value(json!({"id": 2, "result": 1})).unwrap();
        shared.dispatch(response);

        assert!(rx.try_recv().is_err());
        assert_eq!(shared.lock().calls.len(), 1);
    }
}
