//! The typed client most callers want.

use std::sync::Arc;

use serde_json::Value;
use sol_sdk::{Pubkey, Signature, Transaction};
use tokio::sync::Mutex;

use crate::calls::*;
use crate::config::{CallOptions, RpcClientConfig};
use crate::dispatcher::Dispatcher;
use crate::error::RpcError;
use crate::http_sender::HttpSender;
use crate::pubsub::{PubsubClient, Subscription};
use crate::sender::{RequestIds, RpcSender};
use crate::subscriptions::SubscriptionMethod;
use crate::types::*;

/// Calls go over HTTP; subscriptions over a websocket opened on first use.
/// Safe to share between tasks.
///
/// Subscriptions end with [`RpcError::ConnectionClosed`] when the client
/// is dropped. After the websocket fails, the next `subscribe` dials a new
/// one; nothing is retried automatically.
pub struct RpcClient {
    config: RpcClientConfig,
    http: Dispatcher<dyn RpcSender>,
    pubsub: Mutex<Option<Arc<Dispatcher<PubsubClient>>>>,
}

impl RpcClient {
    pub fn new(http_url: impl Into<String>) -> Result<Self, RpcError> {
        Self::with_config(RpcClientConfig::new(http_url))
    }

    pub fn with_config(config: RpcClientConfig) -> Result<Self, RpcError> {
        config.validate()?;
        let sender = HttpSender::new(&config)?;
        Ok(Self::with_sender(Arc::new(sender), config))
    }

    /// Uses `sender` for calls instead of HTTP.
    pub fn with_sender(sender: Arc<dyn RpcSender>, config: RpcClientConfig) -> Self {
        Self {
            http: Dispatcher::new(sender, &config),
            config,
            pubsub: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &RpcClientConfig {
        &self.config
    }

    pub fn url(&self) -> String {
        self.http.sender().url()
    }

    pub async fn call<C: Call>(&self, call: C) -> Result<C::Response, RpcError> {
        self.call_with_options(call, &CallOptions::default()).await
    }

    pub async fn call_with_options<C: Call>(
        &self,
        mut call: C,
        options: &CallOptions,
    ) -> Result<C::Response, RpcError> {
        self.apply_defaults(&mut call);
        let params = call.params()?;
        let value = self.http.call(C::METHOD, params, options).await?;
        call.process_response(value)
    }

    /// Sends calls of one kind as a single batch. Each entry succeeds or
    /// fails on its own.
    pub async fn batch<C: Call>(
        &self,
        mut calls: Vec<C>,
    ) -> Result<Vec<Result<C::Response, RpcError>>, RpcError> {
        let mut raw = Vec::with_capacity(calls.len());
        for call in &mut calls {
            self.apply_defaults(call);
            raw.push((C::METHOD.to_string(), call.params()?));
        }
        let results = self.http.batch(raw, &CallOptions::default()).await?;
        Ok(calls
            .iter()
            .zip(results)
            .map(|(call, result)| result.and_then(|value| call.process_response(value)))
            .collect())
    }

    /// Batch of untyped `(method, params)` pairs, for mixing methods.
    pub async fn batch_raw(
        &self,
        calls: Vec<(String, Value)>,
        options: &CallOptions,
    ) -> Result<Vec<Result<Value, RpcError>>, RpcError> {
        self.http.batch(calls, options).await
    }

    pub async fn subscribe<S: SubscriptionMethod>(
        &self,
        method: S,
    ) -> Result<Subscription<S::Notification>, RpcError> {
        self.subscribe_with_options(method, &CallOptions::default())
            .await
    }

    pub async fn subscribe_with_options<S: SubscriptionMethod>(
        &self,
        method: S,
        options: &CallOptions,
    ) -> Result<Subscription<S::Notification>, RpcError> {
        let params = method.params()?;
        let pubsub = self.pubsub().await?;
        pubsub
            .subscribe(S::SUBSCRIBE, S::UNSUBSCRIBE, params, options)
            .await
    }

    async fn pubsub(&self) -> Result<Arc<Dispatcher<PubsubClient>>, RpcError> {
        let mut slot = self.pubsub.lock().await;
        if let Some(pubsub) = slot.as_ref() {
            if !pubsub.sender().is_closed() {
                return Ok(pubsub.clone());
            }
        }
        let ids = RequestIds::default();
        let client = PubsubClient::connect(&self.config, ids.clone()).await?;
        let pubsub = Arc::new(Dispatcher::with_ids(Arc::new(client), &self.config, ids));
        *slot = Some(pubsub.clone());
        Ok(pubsub)
    }

    fn apply_defaults<C: Call>(&self, call: &mut C) {
        if let Some(level) = self.config.commitment {
            if let Some(commitment) = call.commitment_mut() {
                commitment.get_or_insert(level);
            }
        }
    }

    // ─── Convenience wrappers ───────────────────────────────────────

    pub async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, RpcError> {
        Ok(self.call(GetBalance::new(*pubkey)).await?.value)
    }

    pub async fn get_account_info(&self, pubkey: &Pubkey) -> Result<Option<UiAccount>, RpcError> {
        Ok(self.call(GetAccountInfo::new(*pubkey)).await?.value)
    }

    pub async fn get_latest_blockhash(&self) -> Result<RpcBlockhash, RpcError> {
        Ok(self.call(GetLatestBlockhash::default()).await?.value)
    }

    pub async fn get_slot(&self) -> Result<u64, RpcError> {
        self.call(GetSlot::default()).await
    }

    pub async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<TransactionStatus>>, RpcError> {
        Ok(self
            .call(GetSignatureStatuses::new(signatures.to_vec()))
            .await?
            .value)
    }

    /// Submits `transaction` encoded with the configured `send_encoding`.
    /// Local checks (every signature present, packet size) run first.
    pub async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        transaction.ensure_within_packet_limit()?;
        let call =
            SendTransaction::new(transaction.clone()).with_encoding(self.config.send_encoding);
        self.call(call).await
    }

    pub async fn simulate_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<RpcSimulateTransactionResult, RpcError> {
        let mut call = SimulateTransaction::new(transaction.clone());
        call.config.encoding = Some(self.config.send_encoding);
        Ok(self.call(call).await?.value)
    }
}
