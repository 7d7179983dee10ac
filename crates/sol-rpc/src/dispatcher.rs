//! Request/response correlation, batching, deadlines and cancellation on
//! top of any [`RpcSender`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::config::{CallOptions, RpcClientConfig};
use crate::error::RpcError;
use crate::pubsub::{PubsubClient, Subscription};
use crate::request::RpcRequest;
use crate::sender::{RequestIds, RpcSender};

pub struct Dispatcher<S: ?Sized> {
    sender: Arc<S>,
    ids: RequestIds,
    request_timeout: Duration,
    max_batch_size: usize,
}

impl<S: RpcSender + ?Sized> Dispatcher<S> {
    pub fn new(sender: Arc<S>, config: &RpcClientConfig) -> Self {
        Self::with_ids(sender, config, RequestIds::default())
    }

    pub fn with_ids(sender: Arc<S>, config: &RpcClientConfig, ids: RequestIds) -> Self {
        Self {
            sender,
            ids,
            request_timeout: config.request_timeout(),
            max_batch_size: config.max_batch_size,
        }
    }

    pub fn sender(&self) -> &Arc<S> {
        &self.sender
    }

    /// Sends one call and returns its `result`.
    pub async fn call(
        &self,
        method: &str,
        params: Value,
        options: &CallOptions,
    ) -> Result<Value, RpcError> {
        let id = self.ids.next();
        debug!(id, method, "rpc call");
        let response = self
            .run(options, self.sender.send(RpcRequest::new(id, method, params)))
            .await?;
        trace!(id, ?response, "rpc reply");

        match response.id {
            Some(reply_id) if reply_id == id => response.into_result(),
            // The server could not tie its error to a request.
            None if response.error.is_some() => response.into_result(),
            other => Err(RpcError::InvalidResponse(format!(
                "reply id {other:?} does not match request id {id}"
            ))),
        }
    }

    /// Sends `calls` as one batch. The outer error covers the batch as a
    /// whole; each entry carries its own result, in request order.
    pub async fn batch(
        &self,
        calls: Vec<(String, Value)>,
        options: &CallOptions,
    ) -> Result<Vec<Result<Value, RpcError>>, RpcError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        if calls.len() > self.max_batch_size {
            return Err(RpcError::LimitExceeded(format!(
                "batch of {} calls exceeds the limit of {}",
                calls.len(),
                self.max_batch_size
            )));
        }

        let requests: Vec<RpcRequest> = calls
            .into_iter()
            .map(|(method, params)| RpcRequest::new(self.ids.next(), method, params))
            .collect();
        let ids: Vec<u64> = requests.iter().map(|request| request.id).collect();
        debug!(len = ids.len(), first_id = ids[0], "rpc batch");

        let responses = self.run(options, self.sender.send_batch(requests)).await?;
        let mut by_id = HashMap::with_capacity(responses.len());
        for response in responses {
            match response.id {
                Some(id) => {
                    by_id.insert(id, response);
                }
                None => match response.error {
                    Some(error) => {
                        return Err(RpcError::BatchRejected {
                            code: error.code,
                            message: error.message,
                        })
                    }
                    None => warn!("batch entry without id"),
                },
            }
        }

        Ok(ids
            .into_iter()
            .map(|id| match by_id.remove(&id) {
                Some(response) => response.into_result(),
                None => Err(RpcError::InvalidResponse(format!("no reply for request {id}"))),
            })
            .collect())
    }

    /// Drives `fut` under the call's deadline and cancellation token. The
    /// future is dropped as soon as either fires.
    async fn run<T>(
        &self,
        options: &CallOptions,
        fut: impl Future<Output = Result<T, RpcError>>,
    ) -> Result<T, RpcError> {
        let timeout = options.timeout.unwrap_or(self.request_timeout);
        let cancel = options.cancel.clone().unwrap_or_default();
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(RpcError::Cancelled),
            result = tokio::time::timeout(timeout, fut) => {
                result.map_err(|_| RpcError::Timeout(timeout))?
            }
        }
    }
}

impl Dispatcher<PubsubClient> {
    pub async fn subscribe<T: DeserializeOwned + Send + 'static>(
        &self,
        method: &str,
        unsubscribe_method: &str,
        params: Value,
        options: &CallOptions,
    ) -> Result<Subscription<T>, RpcError> {
        self.run(
            options,
            self.sender.subscribe(method, unsubscribe_method, params),
        )
        .await
    }
}
