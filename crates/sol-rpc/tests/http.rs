//! Client against a local HTTP JSON-RPC server.
//!
//! Each test binds its own ephemeral port, so they run in parallel.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use sol_rpc::calls::GetBalance;
use sol_rpc::*;
use sol_sdk::Pubkey;
use tokio_util::sync::CancellationToken;
use warp::Filter;

fn reply(request: &Value, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": request["id"], "result": result})
}

fn error_reply(request: &Value, code: i64, message: &str) -> Value {
    json!({"jsonrpc": "2.0", "id": request["id"], "error": {"code": code, "message": message}})
}

/// Replies to every request with its first positional parameter. Batches
/// are answered in reverse order.
fn echo(body: Value) -> Value {
    match body {
        Value::Array(requests) => Value::Array(
            requests
                .iter()
                .rev()
                .map(|request| reply(request, request["params"][0].clone()))
                .collect(),
        ),
        request => reply(&request, request["params"][0].clone()),
    }
}

async fn serve<F>(handler: F) -> String
where
    F: Fn(Value) -> Value + Clone + Send + Sync + 'static,
{
    let route = warp::post()
        .and(warp::body::json())
        .map(move |body: Value| warp::reply::json(&handler(body)));
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{addr}")
}

async fn serve_slow(delay: Duration) -> String {
    let route = warp::post()
        .and(warp::body::json())
        .and_then(move |body: Value| async move {
            tokio::time::sleep(delay).await;
            Ok::<_, Infallible>(warp::reply::json(&echo(body)))
        });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{addr}")
}

fn client(url: String) -> RpcClient {
    RpcClient::new(url).unwrap()
}

// ─── Single calls ───────────────────────────────────────────────────

#[tokio::test]
async fn typed_call_round_trip() {
    let url = serve(|request: Value| {
        assert_eq!(request["jsonrpc"], "2.0");
        match request["method"].as_str() {
            Some("getSlot") => reply(&request, json!(42)),
            Some("getBalance") => {
                reply(&request, json!({"context": {"slot": 9}, "value": 1_000_000}))
            }
            _ => error_reply(&request, -32601, "Method not found"),
        }
    })
    .await;
    let client = client(url);

    assert_eq!(client.get_slot().await.unwrap(), 42);
    assert_eq!(client.get_balance(&Pubkey::new_unique()).await.unwrap(), 1_000_000);
}

#[tokio::test]
async fn server_error_is_reported_with_its_code() {
    let url = serve(|request: Value| error_reply(&request, -32602, "Invalid param: WrongSize")).await;
    let err = client(url).get_balance(&Pubkey::default()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.server_code(), Some(-32602));
    match err {
        RpcError::Server { message, .. } => assert!(message.contains("WrongSize")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_status_is_a_transport_error() {
    let route = warp::post().map(|| {
        warp::reply::with_status("upstream unavailable", warp::http::StatusCode::BAD_GATEWAY)
    });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let err = client(format!("http://{addr}")).get_slot().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("http://{addr}")).get_slot().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn oversized_response_is_rejected() {
    let url = serve(|request: Value| reply(&request, json!("x".repeat(4096)))).await;
    let config = RpcClientConfig {
        max_response_size: 256,
        ..RpcClientConfig::new(url)
    };
    let client = RpcClient::with_config(config).unwrap();

    let err = client.batch_raw(vec![("getHealth".into(), json!([]))], &CallOptions::default()).await;
    assert!(matches!(err, Err(RpcError::LimitExceeded(_))));
    let err = client.call(sol_rpc::calls::GetHealth).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LimitExceeded);
}

// ─── Batches ────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_results_follow_request_order() {
    let url = serve(echo).await;
    let calls = (0..5)
        .map(|n| ("echo".to_string(), json!([n])))
        .collect::<Vec<_>>();

    let results = client(url)
        .batch_raw(calls, &CallOptions::default())
        .await
        .unwrap();
    let values = results
        .into_iter()
        .map(Result::unwrap)
        .collect::<Vec<_>>();
    assert_eq!(values, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
}

#[tokio::test]
async fn batch_entries_fail_independently() {
    let url = serve(|body: Value| {
        let Value::Array(requests) = body else {
            panic!("expected a batch");
        };
        Value::Array(
            requests
                .iter()
                .map(|request| {
                    if request["params"][0].as_u64() == Some(1) {
                        error_reply(request, -32004, "Block not available")
                    } else {
                        reply(request, json!({"context": {"slot": 1}, "value": 5}))
                    }
                })
                .collect(),
        )
    })
    .await;

    let calls = (0..3)
        .map(|n| ("getBalance".to_string(), json!([n])))
        .collect::<Vec<_>>();
    let results = client(url)
        .batch_raw(calls, &CallOptions::default())
        .await
        .unwrap();
    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err().server_code(), Some(-32004));
    assert!(results[2].is_ok());
}

#[tokio::test]
async fn typed_batch_over_http() {
    let url = serve(|body: Value| {
        let Value::Array(requests) = body else {
            panic!("expected a batch");
        };
        Value::Array(
            requests
                .iter()
                .map(|request| reply(request, json!({"context": {"slot": 3}, "value": 77})))
                .collect(),
        )
    })
    .await;

    let results = client(url)
        .batch(vec![GetBalance::new(Pubkey::new_unique()), GetBalance::new(Pubkey::new_unique())])
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    for result in results {
        assert_eq!(result.unwrap().value, 77);
    }
}

#[tokio::test]
async fn batch_rejected_as_a_whole() {
    let url = serve(|_| {
        json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32600, "message": "batch too large"}})
    })
    .await;

    let err = client(url)
        .batch_raw(vec![("getSlot".into(), json!([]))], &CallOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::BatchRejected { code: -32600, .. }));
}

#[tokio::test]
async fn oversized_batch_never_leaves_the_client() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let url = serve(move |body: Value| {
        counter.fetch_add(1, Ordering::SeqCst);
        echo(body)
    })
    .await;
    let config = RpcClientConfig {
        max_batch_size: 2,
        ..RpcClientConfig::new(url)
    };
    let client = RpcClient::with_config(config).unwrap();

    let calls = (0..3)
        .map(|n| ("echo".to_string(), json!([n])))
        .collect::<Vec<_>>();
    let err = client
        .batch_raw(calls, &CallOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LimitExceeded);
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    let empty = client.batch_raw(vec![], &CallOptions::default()).await.unwrap();
    assert!(empty.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

// ─── Deadlines and cancellation ─────────────────────────────────────

#[tokio::test]
async fn slow_server_times_out() {
    let url = serve_slow(Duration::from_secs(5)).await;
    let options = CallOptions::default().with_timeout(Duration::from_millis(100));

    let err = client(url)
        .call_with_options(sol_rpc::calls::GetSlot::default(), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::Timeout(d) if d == Duration::from_millis(100)));
}

#[tokio::test]
async fn configured_timeout_applies_by_default() {
    let url = serve_slow(Duration::from_secs(5)).await;
    let config = RpcClientConfig {
        request_timeout_ms: 100,
        ..RpcClientConfig::new(url)
    };
    let err = RpcClient::with_config(config)
        .unwrap()
        .get_slot()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn cancelled_call_returns_promptly() {
    let url = serve_slow(Duration::from_secs(5)).await;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let options = CallOptions::default().with_cancel(cancel);
    let started = std::time::Instant::now();
    let err = client(url)
        .call_with_options(sol_rpc::calls::GetSlot::default(), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
}
