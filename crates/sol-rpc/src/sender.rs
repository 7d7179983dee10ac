//! The transport seam under the dispatcher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RpcError;
use crate::request::{Response, RpcRequest};

/// Moves JSON-RPC envelopes to a server and back.
///
/// Implementations do not interpret `result` or `error`; the dispatcher
/// correlates ids and surfaces server errors.
#[async_trait]
pub trait RpcSender: Send + Sync {
    async fn send(&self, request: RpcRequest) -> Result<Response, RpcError>;

    /// Sends every request as one batch. The replies may come back in any
    /// order.
    async fn send_batch(&self, requests: Vec<RpcRequest>) -> Result<Vec<Response>, RpcError>;

    fn url(&self) -> String;
}

/// Monotonic request id source. Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct RequestIds(Arc<AtomicU64>);

impl RequestIds {
    /// Next id, starting at 1.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}
