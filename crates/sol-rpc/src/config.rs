//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::RpcError;
use crate::types::{CommitmentLevel, TransactionEncoding};

/// What a subscription does when its subscriber stops draining events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// End the subscription with [`RpcError::SubscriptionLagged`].
    #[default]
    Lagged,
    /// Drop the event that did not fit and keep going.
    DropNewest,
    /// Stall the connection until the subscriber catches up.
    Backpressure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RpcClientConfig {
    pub http_url: String,
    /// Derived from `http_url` when unset.
    pub ws_url: Option<String>,
    pub request_timeout_ms: u64,
    pub max_batch_size: usize,
    pub max_response_size: usize,
    pub subscription_capacity: usize,
    pub overflow: OverflowPolicy,
    /// Injected into calls that accept a commitment and did not set one.
    pub commitment: Option<CommitmentLevel>,
    pub send_encoding: TransactionEncoding,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            http_url: "http://127.0.0.1:8899".to_string(),
            ws_url: None,
            request_timeout_ms: 30_000,
            max_batch_size: 100,
            max_response_size: 16 * 1024 * 1024,
            subscription_capacity: 1024,
            overflow: OverflowPolicy::default(),
            commitment: None,
            send_encoding: TransactionEncoding::default(),
        }
    }
}

impl RpcClientConfig {
    pub fn new(http_url: impl Into<String>) -> Self {
        Self {
            http_url: http_url.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RpcError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn http_url(&self) -> Result<Url, RpcError> {
        Url::parse(&self.http_url)
            .map_err(|e| RpcError::InvalidConfig(format!("http_url {:?}: {e}", self.http_url)))
    }

    /// The explicit `ws_url`, or `http_url` with `ws`/`wss` swapped in and
    /// an explicit port bumped by one.
    pub fn websocket_url(&self) -> Result<Url, RpcError> {
        if let Some(ws) = &self.ws_url {
            return Url::parse(ws)
                .map_err(|e| RpcError::InvalidConfig(format!("ws_url {ws:?}: {e}")));
        }

        let mut url = self.http_url()?;
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(RpcError::InvalidConfig(format!(
                    "cannot derive a websocket url from scheme {other:?}"
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| RpcError::InvalidConfig(format!("cannot set scheme {scheme}")))?;
        if let Some(port) = url.port() {
            let next = port
                .checked_add(1)
                .ok_or_else(|| RpcError::InvalidConfig(format!("port {port} has no successor")))?;
            url.set_port(Some(next))
                .map_err(|()| RpcError::InvalidConfig("cannot set websocket port".into()))?;
        }
        Ok(url)
    }

    pub fn validate(&self) -> Result<(), RpcError> {
        self.http_url()?;
        self.websocket_url()?;
        let limits = [
            ("request_timeout_ms", self.request_timeout_ms == 0),
            ("max_batch_size", self.max_batch_size == 0),
            ("max_response_size", self.max_response_size == 0),
            ("subscription_capacity", self.subscription_capacity == 0),
        ];
        for (name, zero) in limits {
            if zero {
                return Err(RpcError::InvalidConfig(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }
}

/// Per-call deadline and cancellation. Unset fields fall back to the
/// client's configured timeout and no cancellation.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl CallOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}
