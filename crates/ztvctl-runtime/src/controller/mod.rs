//! Worker controller: process lifecycle plus the topology mirror.
//!
//! Every mirror operation follows call-then-mutate: local preconditions are
//! checked first, then the worker is asked, and the mirror only changes once
//! the worker confirmed. A failed call leaves the mirror as it was.
//!
//! Each started (or attached) worker gets a new generation. The mirror is
//! tagged with the generation that owns it, so confirmations and exit
//! notifications from a superseded worker are recognized and dropped.

mod mirror;
mod requests;

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Value, json};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex as AsyncMutex, RwLock, oneshot, watch};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use ztvctl_core::{
    Channel, ChannelParams, ControllerConfig, DeltaStatistics, InputStream, LogLevel,
    OutputStream, SavedState, SdiDevice, Statistics, Tunnel, WorkerEvent, WorkerEventEmitter,
    WorkerStatus,
};
use ztvctl_rpc::RpcClient;

use crate::error::{ControllerError, StreamDirection};
use crate::process::{
    ExitReport, WorkerHandle, WorkerState, force_kill, spawn_stream_reader,
};
use mirror::Mirror;

pub type Result<T> = std::result::Result<T, ControllerError>;

type ExitReceiver = watch::Receiver<Option<ExitReport>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The worker currently owned by the controller.
struct ActiveWorker {
    handle: WorkerHandle,
    client: Arc<RpcClient>,
    /// `None` for attached transports without a process.
    exit: Option<ExitReceiver>,
    kill: Option<oneshot::Sender<()>>,
}

/// What `stop()` needs after detaching the kill switch.
struct Stopping {
    generation: u64,
    client: Arc<RpcClient>,
    exit: Option<ExitReceiver>,
    kill: Option<oneshot::Sender<()>>,
}

/// State shared with exit watcher tasks.
struct Shared {
    active: Mutex<Option<ActiveWorker>>,
    state: Mutex<WorkerState>,
    mirror: RwLock<Mirror>,
    emitter: Arc<dyn WorkerEventEmitter>,
}

impl Shared {
    fn set_state(&self, state: WorkerState) {
        *lock(&self.state) = state;
    }

    async fn activate(&self, worker: ActiveWorker) {
        let mut mirror = self.mirror.write().await;
        mirror.adopt(worker.handle.generation);
        *lock(&self.active) = Some(worker);
        self.set_state(WorkerState::Running);
    }

    fn begin_stop(&self) -> Option<Stopping> {
        let mut active = lock(&self.active);
        let worker = active.as_mut()?;
        self.set_state(WorkerState::Stopping);
        Some(Stopping {
            generation: worker.handle.generation,
            client: Arc::clone(&worker.client),
            exit: worker.exit.clone(),
            kill: worker.kill.take(),
        })
    }

    /// Drop the worker of `generation` together with its client and mirror.
    ///
    /// Returns `false` without touching anything if a different worker is
    /// current, which is how late exit notifications are ignored.
    async fn release(&self, generation: u64, code: Option<i32>) -> bool {
        let mut mirror = self.mirror.write().await;
        let worker = {
            let mut active = lock(&self.active);
            match active.as_ref() {
                Some(current) if current.handle.generation == generation => active.take(),
                _ => None,
            }
        };
        let Some(worker) = worker else {
            debug!(generation, "Ignoring exit of superseded worker");
            return false;
        };

        mirror.release();
        drop(mirror);
        self.set_state(WorkerState::Stopped);
        worker.client.close().await;

        info!(generation, pid = ?worker.handle.pid, ?code, "Worker released");
        self.emitter.emit(WorkerEvent::stopped(code));
        true
    }
}

/// Supervises one worker process at a time and mirrors its topology.
///
/// Lifecycle operations (`start`, `stop`, `restart`, `attach`) are serialized
/// by an internal lock; mirror operations and queries may run concurrently
/// with each other.
pub struct WorkerController {
    config: ControllerConfig,
    worker_path: Mutex<PathBuf>,
    lifecycle: AsyncMutex<()>,
    shared: Arc<Shared>,
    generation: AtomicU64,
}

impl WorkerController {
    pub fn new(config: ControllerConfig, emitter: Arc<dyn WorkerEventEmitter>) -> Self {
        let worker_path = Mutex::new(config.worker_path.clone());
        Self {
            config,
            worker_path,
            lifecycle: AsyncMutex::new(()),
            shared: Arc::new(Shared {
                active: Mutex::new(None),
                state: Mutex::new(WorkerState::Stopped),
                mirror: RwLock::new(Mirror::default()),
                emitter,
            }),
            generation: AtomicU64::new(0),
        }
    }

    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Binary used by the next `start(None)`.
    pub fn worker_path(&self) -> PathBuf {
        lock(&self.worker_path).clone()
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawn the worker. `path` replaces the remembered worker path.
    pub async fn start(&self, path: Option<PathBuf>) -> Result<WorkerHandle> {
        let _lifecycle = self.lifecycle.lock().await;
        self.start_locked(path).await
    }

    /// Ask the worker to shut down, killing it if it does not comply.
    /// No-op when nothing is running.
    pub async fn stop(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        self.stop_locked().await
    }

    /// Stop the current worker (if any) and start a fresh one on the
    /// remembered path. The mirror starts empty.
    pub async fn restart(&self) -> Result<WorkerHandle> {
        let _lifecycle = self.lifecycle.lock().await;
        info!("Restarting worker");
        self.shared.emitter.emit(WorkerEvent::Restarting);
        self.stop_locked().await?;
        self.start_locked(None).await
    }

    /// Adopt an already connected transport as the current worker.
    ///
    /// There is no process behind it: `stop()` sends `shutdown` and closes the
    /// client without waiting for an exit.
    pub async fn attach(&self, client: RpcClient) -> Result<WorkerHandle> {
        let _lifecycle = self.lifecycle.lock().await;
        if self.is_running() {
            return Err(ControllerError::AlreadyRunning);
        }

        let handle = WorkerHandle::new(self.next_generation(), None);
        self.shared
            .activate(ActiveWorker {
                handle: handle.clone(),
                client: Arc::new(client),
                exit: None,
                kill: None,
            })
            .await;

        info!(generation = handle.generation, "Worker transport attached");
        self.shared.emitter.emit(WorkerEvent::started(None));
        Ok(handle)
    }

    async fn start_locked(&self, path: Option<PathBuf>) -> Result<WorkerHandle> {
        if self.is_running() {
            return Err(ControllerError::AlreadyRunning);
        }

        let path = {
            let mut current = lock(&self.worker_path);
            if let Some(path) = path {
                *current = path;
            }
            current.clone()
        };

        self.shared.set_state(WorkerState::Starting);
        info!(path = %path.display(), "Starting worker");

        let spawned = Command::new(&path)
            .args(ControllerConfig::worker_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(source) => {
                self.shared.set_state(WorkerState::Stopped);
                let err = ControllerError::SpawnFailed { path, source };
                warn!(error = %err, "Failed to start worker");
                self.shared.emitter.emit(WorkerEvent::error(err.to_string()));
                return Err(err);
            }
        };

        let pid = child.id();
        let Some((stdin, stdout)) = child.stdin.take().zip(child.stdout.take()) else {
            self.shared.set_state(WorkerState::Stopped);
            return Err(ControllerError::MissingPipe("stdin/stdout"));
        };
        if let Some(stderr) = child.stderr.take() {
            spawn_stream_reader(stderr, pid, "stderr");
        }

        let client = RpcClient::with_timeout(stdin, stdout, self.config.rpc_timeout);
        let handle = WorkerHandle::new(self.next_generation(), pid);
        let (exit_tx, exit_rx) = watch::channel(None);
        let (kill_tx, kill_rx) = oneshot::channel();

        self.shared
            .activate(ActiveWorker {
                handle: handle.clone(),
                client: Arc::new(client),
                exit: Some(exit_rx),
                kill: Some(kill_tx),
            })
            .await;

        info!(generation = handle.generation, ?pid, "Worker started");
        self.shared.emitter.emit(WorkerEvent::started(pid));

        tokio::spawn(watch_exit(
            Arc::clone(&self.shared),
            handle.generation,
            child,
            kill_rx,
            exit_tx,
        ));

        Ok(handle)
    }

    async fn stop_locked(&self) -> Result<()> {
        let Some(stopping) = self.shared.begin_stop() else {
            debug!("Stop requested but no worker is running");
            return Ok(());
        };
        let Stopping {
            generation,
            client,
            exit,
            mut kill,
        } = stopping;

        info!(generation, "Stopping worker");
        let shutdown = client.call(requests::SHUTDOWN, json!({}));
        match timeout(self.config.shutdown_timeout, shutdown).await {
            Ok(Ok(_)) => debug!(generation, "Worker acknowledged shutdown"),
            Ok(Err(e)) if e.is_disconnected() => {
                debug!(generation, "Worker closed its pipe during shutdown");
            }
            Ok(Err(e)) => {
                warn!(generation, error = %e, "Graceful shutdown failed, killing worker");
                send_kill(&mut kill);
            }
            Err(_) => {
                warn!(generation, "Graceful shutdown timed out, killing worker");
                send_kill(&mut kill);
            }
        }

        let code = match exit {
            Some(exit) => self.await_exit(generation, exit, kill).await,
            None => None,
        };
        self.shared.release(generation, code).await;
        Ok(())
    }

    /// Wait for the exit watcher's report, escalating to a kill after the
    /// configured grace period.
    async fn await_exit(
        &self,
        generation: u64,
        mut exit: ExitReceiver,
        mut kill: Option<oneshot::Sender<()>>,
    ) -> Option<i32> {
        if let Ok(code) = timeout(self.config.kill_grace, exit_code(&mut exit)).await {
            return code;
        }
        warn!(generation, grace = ?self.config.kill_grace, "Worker did not exit in time, killing");
        send_kill(&mut kill);
        exit_code(&mut exit).await
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub fn is_running(&self) -> bool {
        lock(&self.shared.active).is_some()
    }

    pub fn state(&self) -> WorkerState {
        *lock(&self.shared.state)
    }

    pub fn handle(&self) -> Option<WorkerHandle> {
        lock(&self.shared.active)
            .as_ref()
            .map(|worker| worker.handle.clone())
    }

    pub fn status(&self) -> WorkerStatus {
        lock(&self.shared.active)
            .as_ref()
            .map_or_else(WorkerStatus::default, |worker| WorkerStatus {
                running: true,
                pid: worker.handle.pid,
                started_at: Some(worker.handle.started_at),
            })
    }

    fn client(&self) -> Result<(Arc<RpcClient>, u64)> {
        lock(&self.shared.active)
            .as_ref()
            .map(|worker| (Arc::clone(&worker.client), worker.handle.generation))
            .ok_or(ControllerError::NotRunning)
    }

    /// Apply a confirmed change, unless the worker that confirmed it has been
    /// replaced in the meantime.
    async fn commit(&self, generation: u64, apply: impl FnOnce(&mut Mirror)) {
        let mut mirror = self.shared.mirror.write().await;
        if mirror.generation == generation {
            apply(&mut *mirror);
        } else {
            debug!(
                generation,
                current = mirror.generation,
                "Discarding update from superseded worker"
            );
        }
    }

    // =========================================================================
    // Channels
    // =========================================================================

    pub async fn add_channel(&self, params: ChannelParams) -> Result<()> {
        let (client, generation) = self.client()?;
        let channel_id = params.channel_id;
        if self.shared.mirror.read().await.channels.contains_key(&channel_id) {
            return Err(ControllerError::ChannelExists(channel_id));
        }

        requests::add_channel(&params)?.send(&client).await?;
        self.commit(generation, |mirror| {
            mirror.channels.insert(channel_id, Channel::new(params));
        })
        .await;

        info!(channel_id, "Channel added");
        Ok(())
    }

    /// Remove a channel and, with it, all of its streams.
    pub async fn remove_channel(&self, channel_id: u32) -> Result<()> {
        let (client, generation) = self.client()?;
        if !self.shared.mirror.read().await.channels.contains_key(&channel_id) {
            return Err(ControllerError::ChannelNotFound(channel_id));
        }

        requests::remove_channel(channel_id).send(&client).await?;
        self.commit(generation, |mirror| {
            mirror.channels.remove(&channel_id);
        })
        .await;

        info!(channel_id, "Channel removed");
        Ok(())
    }

    async fn require_channel(&self, channel_id: u32) -> Result<()> {
        if self.shared.mirror.read().await.channels.contains_key(&channel_id) {
            Ok(())
        } else {
            Err(ControllerError::ChannelNotFound(channel_id))
        }
    }

    async fn require_stream(
        &self,
        channel_id: u32,
        stream_id: u32,
        direction: StreamDirection,
    ) -> Result<()> {
        let mirror = self.shared.mirror.read().await;
        let channel = mirror
            .channels
            .get(&channel_id)
            .ok_or(ControllerError::ChannelNotFound(channel_id))?;
        let found = match direction {
            StreamDirection::Input => channel.input(stream_id).is_some(),
            StreamDirection::Output => channel.output(stream_id).is_some(),
        };
        if found {
            Ok(())
        } else {
            Err(ControllerError::StreamNotFound {
                channel_id,
                stream_id,
                direction,
            })
        }
    }

    // =========================================================================
    // Streams
    // =========================================================================

    /// Add an input to `channel_id`. The stream is re-homed onto that channel
    /// before it is sent.
    pub async fn add_input(&self, channel_id: u32, mut input: InputStream) -> Result<()> {
        let (client, generation) = self.client()?;
        input.set_channel_id(channel_id);
        self.require_channel(channel_id).await?;

        requests::add_input(&input)?.send(&client).await?;
        let (kind, stream_id) = (input.kind(), input.stream_id());
        self.commit(generation, |mirror| {
            if let Some(channel) = mirror.channels.get_mut(&channel_id) {
                channel.inputs.push(input);
            }
        })
        .await;

        info!(channel_id, stream_id, %kind, "Input stream added");
        Ok(())
    }

    pub async fn remove_input(&self, channel_id: u32, stream_id: u32) -> Result<()> {
        let (client, generation) = self.client()?;
        self.require_stream(channel_id, stream_id, StreamDirection::Input)
            .await?;

        requests::remove_input(channel_id, stream_id)
            .send(&client)
            .await?;
        self.commit(generation, |mirror| {
            if let Some(channel) = mirror.channels.get_mut(&channel_id) {
                channel.inputs.retain(|s| s.stream_id() != stream_id);
            }
        })
        .await;

        info!(channel_id, stream_id, "Input stream removed");
        Ok(())
    }

    /// Add an output to `channel_id`. The stream is re-homed onto that channel
    /// before it is sent.
    pub async fn add_output(&self, channel_id: u32, mut output: OutputStream) -> Result<()> {
        let (client, generation) = self.client()?;
        output.set_channel_id(channel_id);
        self.require_channel(channel_id).await?;

        requests::add_output(&output)?.send(&client).await?;
        let (kind, stream_id) = (output.kind(), output.stream_id());
        self.commit(generation, |mirror| {
            if let Some(channel) = mirror.channels.get_mut(&channel_id) {
                channel.outputs.push(output);
            }
        })
        .await;

        info!(channel_id, stream_id, %kind, "Output stream added");
        Ok(())
    }

    pub async fn remove_output(&self, channel_id: u32, stream_id: u32) -> Result<()> {
        let (client, generation) = self.client()?;
        self.require_stream(channel_id, stream_id, StreamDirection::Output)
            .await?;

        requests::remove_output(channel_id, stream_id)
            .send(&client)
            .await?;
        self.commit(generation, |mirror| {
            if let Some(channel) = mirror.channels.get_mut(&channel_id) {
                channel.outputs.retain(|s| s.stream_id() != stream_id);
            }
        })
        .await;

        info!(channel_id, stream_id, "Output stream removed");
        Ok(())
    }

    // =========================================================================
    // Tunnels
    // =========================================================================

    pub async fn add_tunnel(&self, tunnel: Tunnel) -> Result<()> {
        let (client, generation) = self.client()?;
        let tunnel_id = tunnel.tunnel_id;
        if self.shared.mirror.read().await.tunnels.contains_key(&tunnel_id) {
            return Err(ControllerError::TunnelExists(tunnel_id));
        }

        requests::add_tunnel(&tunnel)?.send(&client).await?;
        let mode = tunnel.mode;
        self.commit(generation, |mirror| {
            mirror.tunnels.insert(tunnel_id, tunnel);
        })
        .await;

        info!(tunnel_id, ?mode, "Tunnel added");
        Ok(())
    }

    pub async fn remove_tunnel(&self, tunnel_id: u32) -> Result<()> {
        let (client, generation) = self.client()?;
        if !self.shared.mirror.read().await.tunnels.contains_key(&tunnel_id) {
            return Err(ControllerError::TunnelNotFound(tunnel_id));
        }

        requests::remove_tunnel(tunnel_id).send(&client).await?;
        self.commit(generation, |mirror| {
            mirror.tunnels.remove(&tunnel_id);
        })
        .await;

        info!(tunnel_id, "Tunnel removed");
        Ok(())
    }

    // =========================================================================
    // System
    // =========================================================================

    pub async fn set_logging_level(&self, level: LogLevel) -> Result<()> {
        let (client, generation) = self.client()?;
        requests::set_logging_level(level).send(&client).await?;
        self.commit(generation, |mirror| mirror.logging_level = level)
            .await;

        info!(%level, "Worker logging level set");
        Ok(())
    }

    pub async fn statistics(&self) -> Result<Statistics> {
        let (client, _) = self.client()?;
        Ok(client.call_typed(requests::STATISTICS, json!({})).await?)
    }

    pub async fn delta_statistics(&self) -> Result<DeltaStatistics> {
        let (client, _) = self.client()?;
        Ok(client
            .call_typed(requests::DELTA_STATISTICS, json!({}))
            .await?)
    }

    pub async fn list_sdi_devices(&self) -> Result<Vec<SdiDevice>> {
        let (client, _) = self.client()?;
        Ok(client
            .call_typed(requests::LIST_SDI_DEVICES, json!({}))
            .await?)
    }

    /// The worker's own status report, passed through unchanged.
    pub async fn worker_status(&self) -> Result<Value> {
        let (client, _) = self.client()?;
        Ok(client.call(requests::STATUS, json!({})).await?)
    }

    // =========================================================================
    // Mirror reads
    // =========================================================================

    pub async fn channels(&self) -> Vec<Channel> {
        self.shared.mirror.read().await.channels.values().cloned().collect()
    }

    pub async fn channel(&self, channel_id: u32) -> Option<Channel> {
        self.shared.mirror.read().await.channels.get(&channel_id).cloned()
    }

    pub async fn tunnels(&self) -> Vec<Tunnel> {
        self.shared.mirror.read().await.tunnels.values().cloned().collect()
    }

    pub async fn tunnel(&self, tunnel_id: u32) -> Option<Tunnel> {
        self.shared.mirror.read().await.tunnels.get(&tunnel_id).cloned()
    }

    /// Last logging level the worker confirmed.
    ///
    /// Kept across stop and restart, so after a restart it may name a level
    /// the new worker never received until `set_logging_level` reapplies it.
    pub async fn logging_level(&self) -> LogLevel {
        self.shared.mirror.read().await.logging_level
    }

    // =========================================================================
    // Saved state
    // =========================================================================

    /// Snapshot of the mirror, channels and tunnels sorted by id.
    pub async fn export_state(&self) -> SavedState {
        self.shared.mirror.read().await.export()
    }

    /// Replay a saved topology onto the running worker.
    ///
    /// Tunnels go first since streams may reference them; then each channel
    /// with its inputs and outputs in saved order; then the logging level.
    /// Stops at the first failure, keeping whatever was applied before it.
    pub async fn import_state(&self, state: SavedState) -> Result<()> {
        info!(
            channels = state.channels.len(),
            tunnels = state.tunnels.len(),
            streams = state.stream_count(),
            "Importing state"
        );

        for tunnel in state.tunnels {
            self.add_tunnel(tunnel).await?;
        }

        for channel in state.channels {
            let channel_id = channel.channel_id;
            self.add_channel(channel.params()).await?;
            for input in channel.inputs {
                self.add_input(channel_id, input).await?;
            }
            for output in channel.outputs {
                self.add_output(channel_id, output).await?;
            }
        }

        if let Some(level) = state.logging_level {
            self.set_logging_level(level).await?;
        }
        Ok(())
    }

    /// Remove every channel, then every tunnel. Stops at the first failure.
    pub async fn clear_state(&self) -> Result<()> {
        let (channel_ids, tunnel_ids): (Vec<u32>, Vec<u32>) = {
            let mirror = self.shared.mirror.read().await;
            (
                mirror.channels.keys().copied().collect(),
                mirror.tunnels.keys().copied().collect(),
            )
        };

        for channel_id in channel_ids {
            self.remove_channel(channel_id).await?;
        }
        for tunnel_id in tunnel_ids {
            self.remove_tunnel(tunnel_id).await?;
        }
        Ok(())
    }
}

impl Drop for WorkerController {
    fn drop(&mut self) {
        if let Some(worker) = lock(&self.shared.active).as_mut() {
            send_kill(&mut worker.kill);
        }
    }
}

fn send_kill(kill: &mut Option<oneshot::Sender<()>>) {
    if let Some(kill) = kill.take() {
        // The watcher is gone once the process has been reaped.
        let _ = kill.send(());
    }
}

async fn exit_code(exit: &mut ExitReceiver) -> Option<i32> {
    match exit.wait_for(Option::is_some).await {
        Ok(report) => report.as_ref().and_then(|r| r.code),
        Err(_) => None,
    }
}

/// Owns the child until it exits, either on its own or after a kill request
/// (an explicit send or the controller dropping the sender).
async fn watch_exit(
    shared: Arc<Shared>,
    generation: u64,
    mut child: Child,
    kill: oneshot::Receiver<()>,
    exit: watch::Sender<Option<ExitReport>>,
) {
    let exited = tokio::select! {
        status = child.wait() => Some(status),
        _ = kill => None,
    };
    let status = match exited {
        Some(status) => status,
        None => {
            debug!(generation, "Kill requested");
            force_kill(&mut child).await
        }
    };

    let code = match status {
        Ok(status) => {
            info!(generation, %status, "Worker exited");
            status.code()
        }
        Err(e) => {
            warn!(generation, error = %e, "Failed to wait for worker");
            None
        }
    };

    exit.send_replace(Some(ExitReport { code }));
    shared.release(generation, code).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex, split};
    use tokio::sync::broadcast::error::TryRecvError;
    use ztvctl_core::NoopEmitter;

    use crate::process::WorkerEventBroadcaster;

    fn controller() -> WorkerController {
        WorkerController::new(ControllerConfig::default(), Arc::new(NoopEmitter))
    }

    fn detached_client() -> RpcClient {
        let (ours, _theirs) = duplex(1024);
        let (read, write) = split(ours);
        RpcClient::new(write, read)
    }

    /// Client whose worker acknowledges every request with an empty result.
    fn acknowledging_client() -> RpcClient {
        let (ours, theirs) = duplex(64 * 1024);
        let (read, write) = split(ours);
        tokio::spawn(async move {
            let (worker_read, mut worker_write) = split(theirs);
            let mut requests = BufReader::new(worker_read).lines();
            while let Ok(Some(line)) = requests.next_line().await {
                let request: Value = serde_json::from_str(&line).unwrap();
                let reply = json!({"jsonrpc": "2.0", "id": request["id"], "result": {}});
                let reply = reply.to_string() + "\n";
                if worker_write.write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
            }
        });
        RpcClient::new(write, read)
    }

    #[tokio::test]
    async fn test_late_exit_of_previous_worker_keeps_newer_worker() {
        let broadcaster = WorkerEventBroadcaster::new();
        let mut events = broadcaster.subscribe();
        let controller =
            WorkerController::new(ControllerConfig::default(), Arc::new(broadcaster.clone()));

        let first = controller.attach(acknowledging_client()).await.unwrap();
        assert!(controller.shared.release(first.generation, Some(0)).await);
        let second = controller.attach(acknowledging_client()).await.unwrap();
        controller
            .add_channel(ChannelParams {
                channel_id: 1,
                description: String::new(),
                buffer_duration_ms: 1000,
            })
            .await
            .unwrap();

        assert_eq!(events.try_recv().unwrap(), WorkerEvent::started(None));
        assert_eq!(events.try_recv().unwrap(), WorkerEvent::stopped(Some(0)));
        assert_eq!(events.try_recv().unwrap(), WorkerEvent::started(None));

        // The first worker's exit is reported again, after the second took over.
        assert!(!controller.shared.release(first.generation, Some(0)).await);

        assert_eq!(controller.handle().map(|h| h.generation), Some(second.generation));
        assert_eq!(controller.state(), WorkerState::Running);
        let channels = controller.channels().await;
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].channel_id, 1);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_stale_release_keeps_current_worker() {
        let controller = controller();
        let handle = controller.attach(detached_client()).await.unwrap();

        assert!(!controller.shared.release(handle.generation + 1, Some(0)).await);
        assert!(controller.is_running());
        assert_eq!(controller.state(), WorkerState::Running);

        assert!(controller.shared.release(handle.generation, None).await);
        assert!(!controller.is_running());
        assert_eq!(controller.state(), WorkerState::Stopped);
    }

    #[tokio::test]
    async fn test_commit_from_superseded_worker_is_discarded() {
        let controller = controller();
        let first = controller.attach(detached_client()).await.unwrap();
        controller.shared.release(first.generation, None).await;
        let second = controller.attach(detached_client()).await.unwrap();
        assert!(second.generation > first.generation);

        controller
            .commit(first.generation, |m| m.logging_level = LogLevel::Off)
            .await;
        assert_eq!(controller.logging_level().await, LogLevel::Debug);

        controller
            .commit(second.generation, |m| m.logging_level = LogLevel::Info)
            .await;
        assert_eq!(controller.logging_level().await, LogLevel::Info);
    }

    #[tokio::test]
    async fn test_attach_twice_fails() {
        let controller = controller();
        controller.attach(detached_client()).await.unwrap();
        assert!(matches!(
            controller.attach(detached_client()).await,
            Err(ControllerError::AlreadyRunning)
        ));
    }

    #[tokio::test]
    async fn test_stop_when_stopped_is_noop() {
        let controller = controller();
        controller.stop().await.unwrap();
        assert_eq!(controller.state(), WorkerState::Stopped);
        assert_eq!(controller.status(), WorkerStatus::default());
    }
}
