//! Mock worker speaking the line protocol over in-memory pipes.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex, split};
use tokio::sync::broadcast;
use ztvctl_core::{ControllerConfig, WorkerEvent};
use ztvctl_rpc::RpcClient;
use ztvctl_runtime::{WorkerController, WorkerEventBroadcaster};

/// How the mock answers one request.
pub enum Reply {
    Ok(Value),
    Err(i64, &'static str),
}

pub type Responder = Arc<dyn Fn(&str, &Value) -> Reply + Send + Sync>;

/// Handle on the worker side: the requests it has seen, in order.
#[derive(Clone, Default)]
pub struct MockWorker {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockWorker {
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(method, _)| method).collect()
    }

    pub fn last_params(&self, method: &str) -> Option<Value> {
        self.calls()
            .into_iter()
            .rev()
            .find(|(m, _)| m == method)
            .map(|(_, params)| params)
    }
}

pub fn always_ok() -> Responder {
    Arc::new(|_, _| Reply::Ok(json!({"status": "ok"})))
}

/// Spawn a mock worker and return a client connected to it.
pub fn connect(responder: Responder) -> (RpcClient, MockWorker) {
    let (client_io, worker_io) = duplex(64 * 1024);
    let (client_read, client_write) = split(client_io);
    let (worker_read, mut worker_write) = split(worker_io);

    let worker = MockWorker::default();
    let calls = Arc::clone(&worker.calls);
    tokio::spawn(async move {
        let mut lines = BufReader::new(worker_read).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let request: Value = serde_json::from_str(&line).unwrap();
            let method = request["method"].as_str().unwrap_or_default().to_string();
            let params = request["params"].clone();
            calls.lock().unwrap().push((method.clone(), params.clone()));

            let response = match responder(&method, &params) {
                Reply::Ok(result) => {
                    json!({"jsonrpc": "2.0", "id": request["id"], "result": result})
                }
                Reply::Err(code, message) => json!({
                    "jsonrpc": "2.0",
                    "id": request["id"],
                    "error": {"code": code, "message": message}
                }),
            };
            let frame = response.to_string() + "\n";
            if worker_write.write_all(frame.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let client = RpcClient::with_timeout(client_write, client_read, Duration::from_secs(5));
    (client, worker)
}

pub struct Harness {
    pub controller: Arc<WorkerController>,
    pub worker: MockWorker,
    pub events: broadcast::Receiver<WorkerEvent>,
}

/// A controller with a mock worker attached.
pub async fn attached(responder: Responder) -> Harness {
    let broadcaster = WorkerEventBroadcaster::new();
    let events = broadcaster.subscribe();
    let controller = Arc::new(WorkerController::new(
        ControllerConfig::default(),
        Arc::new(broadcaster),
    ));

    let (client, worker) = connect(responder);
    controller.attach(client).await.unwrap();
    Harness {
        controller,
        worker,
        events,
    }
}
