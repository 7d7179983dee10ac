use std::time::Duration;

use serde_json::Value;
use sol_sdk::SolError;
use thiserror::Error;

/// Coarse failure classes a caller can branch on without matching every
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Codec,
    Crypto,
    Transport,
    Server,
    Timeout,
    Cancelled,
    SubscriptionLagged,
    LimitExceeded,
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Sdk(#[from] SolError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("server error {code}: {message}")]
    Server {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("batch rejected by server ({code}): {message}")]
    BatchRejected { code: i64, message: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error("subscription {subscription} lagged; {skipped} notification(s) dropped")]
    SubscriptionLagged { subscription: u64, skipped: u64 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for RpcError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

impl From<sol_sdk::ValidationError> for RpcError {
    fn from(err: sol_sdk::ValidationError) -> Self {
        Self::Sdk(err.into())
    }
}

impl From<sol_sdk::CodecError> for RpcError {
    fn from(err: sol_sdk::CodecError) -> Self {
        Self::Sdk(err.into())
    }
}

impl RpcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sdk(e) => match e.kind() {
                sol_sdk::ErrorKind::Validation => ErrorKind::Validation,
                sol_sdk::ErrorKind::Codec => ErrorKind::Codec,
                sol_sdk::ErrorKind::Crypto => ErrorKind::Crypto,
            },
            Self::Transport(_) | Self::Http(_) | Self::WebSocket(_) | Self::ConnectionClosed => {
                ErrorKind::Transport
            }
            Self::Server { .. } | Self::BatchRejected { .. } => ErrorKind::Server,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::SubscriptionLagged { .. } => ErrorKind::SubscriptionLagged,
            Self::LimitExceeded(_) => ErrorKind::LimitExceeded,
            Self::Json(_) | Self::InvalidResponse(_) => ErrorKind::Codec,
            Self::InvalidConfig(_) => ErrorKind::Validation,
        }
    }

    /// JSON-RPC error code, for server replies.
    pub fn server_code(&self) -> Option<i64> {
        match self {
            Self::Server { code, .. } | Self::BatchRejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}
