//! In-process [`RpcSender`] with canned replies, for tests and examples.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RpcError;
use crate::request::{Response, RpcRequest};
use crate::sender::RpcSender;

/// JSON-RPC "method not found".
pub const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Default)]
pub struct MockSender {
    replies: Mutex<HashMap<String, Result<Value, (i64, String)>>>,
    latency: Option<Duration>,
    requests: Mutex<Vec<RpcRequest>>,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(self, method: &str, result: Value) -> Self {
        self.set(method, Ok(result));
        self
    }

    pub fn with_error(self, method: &str, code: i64, message: &str) -> Self {
        self.set(method, Err((code, message.to_string())));
        self
    }

    /// Delays every reply. Combine with a paused tokio clock in tests.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replaces the canned reply for `method`.
    pub fn set(&self, method: &str, reply: Result<Value, (i64, String)>) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method.to_string(), reply);
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RpcRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reply(&self, request: &RpcRequest) -> Response {
        let canned = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&request.method)
            .cloned();
        match canned {
            Some(Ok(result)) => Response::success(request.id, result),
            Some(Err((code, message))) => Response::failure(Some(request.id), code, message),
            None => Response::failure(Some(request.id), METHOD_NOT_FOUND, "Method not found"),
        }
    }

    fn record(&self, request: &RpcRequest) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
    }
}

#[async_trait]
impl RpcSender for MockSender {
    async fn send(&self, request: RpcRequest) -> Result<Response, RpcError> {
        self.record(&request);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.reply(&request))
    }

    /// Replies in reverse order, as servers are free to.
    async fn send_batch(&self, requests: Vec<RpcRequest>) -> Result<Vec<Response>, RpcError> {
        for request in &requests {
            self.record(request);
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(requests.iter().rev().map(|request| self.reply(request)).collect())
    }

    fn url(&self) -> String {
        "mock://".to_string()
    }
}
