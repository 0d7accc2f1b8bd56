//! End-to-end tests for the RPC client over in-memory pipes.
//!
//! The "worker" side of each test is driven by hand: it reads request lines
//! from the pipe and writes whatever responses the test needs, in any order.

use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf, duplex,
    split,
};
use ztvctl_rpc::{RpcClient, RpcError};

struct FakeWorker {
    requests: Lines<BufReader<ReadHalf<DuplexStream>>>,
    responses: WriteHalf<DuplexStream>,
}

impl FakeWorker {
    async fn next_request(&mut self) -> Value {
        let line = self
            .requests
            .next_line()
            .await
            .unwrap()
            .expect("client closed the pipe");
        serde_json::from_str(&line).unwrap()
    }

    async fn send_raw(&mut self, text: &str) {
        self.responses.write_all(text.as_bytes()).await.unwrap();
        self.responses.flush().await.unwrap();
    }

    async fn reply(&mut self, id: u64, result: Value) {
        let line = json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string() + "\n";
        self.send_raw(&line).await;
    }
}

fn connect(call_timeout: Duration) -> (RpcClient, FakeWorker) {
    connect_with_buffer(64 * 1024, call_timeout)
}

/// Pipes holding at most `buffer` bytes in flight, so a worker that stops
/// reading blocks the client's writes.
fn connect_with_buffer(buffer: usize, call_timeout: Duration) -> (RpcClient, FakeWorker) {
    let (client_io, worker_io) = duplex(buffer);
    let (client_read, client_write) = split(client_io);
    let (worker_read, worker_write) = split(worker_io);

    let client = RpcClient::with_timeout(client_write, client_read, call_timeout);
    let worker = FakeWorker {
        requests: BufReader::new(worker_read).lines(),
        responses: worker_write,
    };
    (client, worker)
}

fn request_id(request: &Value) -> u64 {
    request["id"].as_u64().unwrap()
}

#[tokio::test]
async fn request_frame_has_version_id_method_and_params() {
    let (client, mut worker) = connect(Duration::from_secs(5));

    let worker_task = tokio::spawn(async move {
        let request = worker.next_request().await;
        worker.reply(request_id(&request), json!({"status": "ok"})).await;
        request
    });

    let result = client
        .call("removeChannel", json!({"channelId": 3}))
        .await
        .unwrap();
    let request = worker_task.await.unwrap();

    assert_eq!(result, json!({"status": "ok"}));
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["id"], 1);
    assert_eq!(request["method"], "removeChannel");
    assert_eq!(request["params"], json!({"channelId": 3}));
}

#[tokio::test]
async fn ids_are_strictly_increasing() {
    let (client, mut worker) = connect(Duration::from_secs(5));

    let worker_task = tokio::spawn(async move {
        let mut ids = Vec::new();
        for _ in 0..3 {
            let request = worker.next_request().await;
            let id = request_id(&request);
            ids.push(id);
            worker.reply(id, Value::Null).await;
        }
        ids
    });

    for _ in 0..3 {
        client.call("status", json!({})).await.unwrap();
    }

    let ids = worker_task.await.unwrap();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn out_of_order_responses_reach_the_right_callers() {
    let (client, mut worker) = connect(Duration::from_secs(5));

    let worker_task = tokio::spawn(async move {
        let mut requests = Vec::new();
        for _ in 0..3 {
            requests.push(worker.next_request().await);
        }
        for request in requests.iter().rev() {
            let method = request["method"].as_str().unwrap().to_string();
            worker.reply(request_id(request), json!(method)).await;
        }
    });

    let (a, b, c) = tokio::join!(
        client.call("alpha", json!({})),
        client.call("beta", json!({})),
        client.call("gamma", json!({})),
    );
    worker_task.await.unwrap();

    assert_eq!(a.unwrap(), json!("alpha"));
    assert_eq!(b.unwrap(), json!("beta"));
    assert_eq!(c.unwrap(), json!("gamma"));
    assert_eq!(client.pending_count(), 0);
}

#[tokio::test]
async fn unknown_ids_and_garbage_lines_are_discarded() {
    let (client, mut worker) = connect(Duration::from_secs(5));

    let worker_task = tokio::spawn(async move {
        let request = worker.next_request().await;
        worker
            .send_raw("{\"jsonrpc\":\"2.0\",\"id\":999,\"result\":\"stray\"}\n")
            .await;
        worker.send_raw("this is not json\n\n").await;
        worker.send_raw("[1,2,3]\n").await;
        worker.reply(request_id(&request), json!("real")).await;
    });

    let result = client.call("status", json!({})).await.unwrap();
    worker_task.await.unwrap();

    assert_eq!(result, json!("real"));
    assert!(!client.is_closed());
}

#[tokio::test]
async fn responses_split_across_reads_are_reassembled() {
    let (client, mut worker) = connect(Duration::from_secs(5));

    let worker_task = tokio::spawn(async move {
        let request = worker.next_request().await;
        let line = json!({"jsonrpc": "2.0", "id": request_id(&request), "result": {"bytes": 12345}})
            .to_string()
            + "\n";
        let (head, tail) = line.split_at(line.len() / 2);
        worker.send_raw(head).await;
        tokio::task::yield_now().await;
        worker.send_raw(tail).await;
    });

    let result = client.call("statistics", json!({})).await.unwrap();
    worker_task.await.unwrap();

    assert_eq!(result, json!({"bytes": 12345}));
}

#[tokio::test]
async fn remote_errors_are_propagated_verbatim() {
    let (client, mut worker) = connect(Duration::from_secs(5));

    let worker_task = tokio::spawn(async move {
        let request = worker.next_request().await;
        let line = json!({
            "jsonrpc": "2.0",
            "id": request_id(&request),
            "error": {"code": -32000, "message": "Channel 7 not found", "data": {"channelId": 7}}
        })
        .to_string()
            + "\n";
        worker.send_raw(&line).await;
    });

    let err = client
        .call("removeChannel", json!({"channelId": 7}))
        .await
        .unwrap_err();
    worker_task.await.unwrap();

    match err {
        RpcError::Remote {
            code,
            message,
            data,
        } => {
            assert_eq!(code, -32000);
            assert_eq!(message, "Channel 7 not found");
            assert_eq!(data, Some(json!({"channelId": 7})));
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn timed_out_call_ignores_late_response() {
    let (client, mut worker) = connect(Duration::from_secs(30));

    let first = client.call("statistics", json!({}));
    let (outcome, request) = tokio::join!(first, worker.next_request());

    assert!(matches!(outcome, Err(RpcError::Timeout { ref method }) if method == "statistics"));
    assert_eq!(client.pending_count(), 0);

    // Late response for the timed-out id, then a normal exchange.
    worker.reply(request_id(&request), json!("late")).await;

    let worker_task = tokio::spawn(async move {
        let request = worker.next_request().await;
        worker.reply(request_id(&request), json!("fresh")).await;
    });
    let result = client.call("status", json!({})).await.unwrap();
    worker_task.await.unwrap();

    assert_eq!(result, json!("fresh"));
}

#[tokio::test]
async fn stream_end_rejects_every_pending_call() {
    let (client, mut worker) = connect(Duration::from_secs(5));

    let worker_task = tokio::spawn(async move {
        for _ in 0..3 {
            worker.next_request().await;
        }
        drop(worker);
    });

    let (a, b, c) = tokio::join!(
        client.call("statistics", json!({})),
        client.call("deltaStatistics", json!({})),
        client.call("status", json!({})),
    );
    worker_task.await.unwrap();

    for outcome in [a, b, c] {
        assert!(matches!(outcome, Err(RpcError::StreamClosed)));
    }
    assert_eq!(client.pending_count(), 0);
    assert!(client.is_closed());
    assert!(matches!(
        client.call("status", json!({})).await,
        Err(RpcError::StreamClosed)
    ));
}

#[tokio::test]
async fn close_rejects_pending_and_later_calls() {
    let (client, mut worker) = connect(Duration::from_secs(5));

    let pending = async {
        tokio::join!(
            client.call("statistics", json!({})),
            client.call("status", json!({})),
        )
    };
    let closer = async {
        worker.next_request().await;
        worker.next_request().await;
        client.close().await;
    };
    let ((a, b), ()) = tokio::join!(pending, closer);

    assert!(matches!(a, Err(RpcError::Closed)));
    assert!(matches!(b, Err(RpcError::Closed)));
    assert!(matches!(
        client.call("status", json!({})).await,
        Err(RpcError::Closed)
    ));

    // Closing twice is harmless; the worker sees EOF on its request pipe.
    client.close().await;
    assert!(worker.requests.next_line().await.unwrap().is_none());
}

#[tokio::test]
async fn typed_calls_deserialize_results() {
    #[derive(Debug, serde::Deserialize)]
    struct Status {
        status: String,
    }

    let (client, mut worker) = connect(Duration::from_secs(5));
    let worker_task = tokio::spawn(async move {
        let request = worker.next_request().await;
        worker.reply(request_id(&request), json!({"status": "ok"})).await;
        let request = worker.next_request().await;
        worker.reply(request_id(&request), json!(42)).await;
    });

    let status: Status = client.call_typed("status", json!({})).await.unwrap();
    assert_eq!(status.status, "ok");

    let err = client
        .call_typed::<Status>("status", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::Protocol(_)));
    worker_task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn timeout_covers_a_worker_that_stops_reading() {
    let (client, _worker) = connect_with_buffer(64, Duration::from_millis(100));
    let padding = "x".repeat(4096);

    let outcome = tokio::time::timeout(
        Duration::from_secs(60),
        client.call("statistics", json!({"pad": padding})),
    )
    .await
    .expect("call must resolve within its own timeout");
    assert!(matches!(outcome, Err(RpcError::Timeout { ref method }) if method == "statistics"));

    // The blocked frame must not hold up later callers either.
    let outcome = tokio::time::timeout(Duration::from_secs(60), client.call("status", json!({})))
        .await
        .expect("second call must resolve within its own timeout");
    assert!(matches!(outcome, Err(RpcError::Timeout { ref method }) if method == "status"));
    assert_eq!(client.pending_count(), 0);

    // Closing does not wait for the stuck write.
    client.close().await;
    assert!(client.is_closed());
}

#[tokio::test(start_paused = true)]
async fn abandoned_call_still_writes_a_whole_frame() {
    let (client, mut worker) = connect_with_buffer(64, Duration::from_secs(30));
    let padding = "x".repeat(4096);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        client.call("statistics", json!({"pad": padding})),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(client.pending_count(), 0);

    let worker_task = tokio::spawn(async move {
        let abandoned = worker.next_request().await;
        assert_eq!(abandoned["method"], "statistics");
        assert_eq!(abandoned["params"]["pad"].as_str().unwrap().len(), 4096);

        let request = worker.next_request().await;
        assert_eq!(request["method"], "status");
        worker.reply(request_id(&request), json!({"status": "ok"})).await;
    });

    let result = client.call("status", json!({})).await.unwrap();
    worker_task.await.unwrap();
    assert_eq!(result, json!({"status": "ok"}));
}

#[tokio::test]
async fn unterminated_fragment_at_stream_end_is_dropped() {
    let (client, mut worker) = connect(Duration::from_secs(5));

    let worker_task = tokio::spawn(async move {
        let request = worker.next_request().await;
        let line = json!({"jsonrpc": "2.0", "id": request_id(&request), "result": 1}).to_string();
        worker.send_raw(&line).await;
        drop(worker);
    });

    let outcome = client.call("status", json!({})).await;
    worker_task.await.unwrap();
    assert!(matches!(outcome, Err(RpcError::StreamClosed)));
}
