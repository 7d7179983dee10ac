//! Online half of the Solana client SDK: a JSON-RPC client.
//!
//! [`RpcClient`] sends typed calls from [`calls`] over HTTP and opens a
//! websocket for [`subscriptions`] the first time one is requested. Both
//! transports sit behind [`RpcSender`], and [`Dispatcher`] adds request
//! ids, batching, timeouts and cancellation on top of any of them.
//!
//! Every error is an [`RpcError`]; [`RpcError::kind`] groups them for
//! callers that only care about the broad category.

pub mod calls;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http_sender;
pub mod mock_sender;
pub mod pubsub;
pub mod request;
pub mod sender;
pub mod serde_utils;
pub mod sol_data;
pub mod subscriptions;
pub mod types;

pub use calls::Call;
pub use client::RpcClient;
pub use config::{CallOptions, OverflowPolicy, RpcClientConfig};
pub use dispatcher::Dispatcher;
pub use error::{ErrorKind, RpcError};
pub use http_sender::HttpSender;
pub use mock_sender::MockSender;
pub use pubsub::{PubsubClient, Subscription};
pub use sender::{RequestIds, RpcSender};
pub use sol_data::SolData;
pub use subscriptions::SubscriptionMethod;

pub use sol_sdk;
