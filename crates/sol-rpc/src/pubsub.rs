//! Persistent websocket transport.
//!
//! One task owns the socket together with the table of in-flight requests
//! and live subscriptions. Callers talk to it over an unbounded command
//! channel and wait on oneshot replies, so the tables have exactly one
//! mutator. When the socket dies every waiter is released with
//! [`RpcError::ConnectionClosed`] and every subscription ends with the same
//! error on its error channel.

use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::{OverflowPolicy, RpcClientConfig};
use crate::error::RpcError;
use crate::request::{Notification, Response, RpcRequest};
use crate::sender::{RequestIds, RpcSender};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Reply<T> = oneshot::Sender<Result<T, RpcError>>;

pub(crate) enum Command {
    Request {
        id: u64,
        payload: String,
        reply: Reply<Response>,
    },
    Subscribe {
        id: u64,
        payload: String,
        unsubscribe_method: String,
        sink: Box<dyn NotificationSink>,
        reply: Reply<u64>,
    },
    /// The caller stopped waiting for `id`.
    Forget { id: u64 },
    Unsubscribe {
        subscription: u64,
        reply: Option<Reply<()>>,
    },
}

impl Command {
    fn fail(self, error: RpcError) {
        match self {
            Self::Request { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            Self::Subscribe { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            Self::Unsubscribe {
                reply: Some(reply), ..
            } => {
                let _ = reply.send(Err(error));
            }
            Self::Unsubscribe { reply: None, .. } | Self::Forget { .. } => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    /// The subscription is over; drop the sink and unsubscribe.
    Stop,
}

/// Type-erased receiving end of one subscription, owned by the connection
/// task.
#[async_trait]
pub(crate) trait NotificationSink: Send {
    fn bind(&mut self, subscription: u64);

    async fn deliver(&mut self, result: Value) -> Delivery;

    fn fail(self: Box<Self>, error: RpcError);
}

struct TypedSink<T> {
    subscription: u64,
    events: mpsc::Sender<T>,
    errors: Option<oneshot::Sender<RpcError>>,
    policy: OverflowPolicy,
    skipped: u64,
}

impl<T> TypedSink<T> {
    fn finish(&mut self, error: RpcError) {
        if let Some(errors) = self.errors.take() {
            let _ = errors.send(error);
        }
    }
}

#[async_trait]
impl<T: DeserializeOwned + Send + 'static> NotificationSink for TypedSink<T> {
    fn bind(&mut self, subscription: u64) {
        self.subscription = subscription;
    }

    async fn deliver(&mut self, result: Value) -> Delivery {
        let event = match serde_json::from_value::<T>(result) {
            Ok(event) => event,
            Err(e) => {
                warn!(subscription = self.subscription, error = %e, "undecodable notification");
                self.finish(RpcError::InvalidResponse(format!("notification: {e}")));
                return Delivery::Stop;
            }
        };

        match self.policy {
            OverflowPolicy::Backpressure => match self.events.send(event).await {
                Ok(()) => Delivery::Delivered,
                Err(_) => Delivery::Stop,
            },
            OverflowPolicy::DropNewest => match self.events.try_send(event) {
                Ok(()) => Delivery::Delivered,
                Err(TrySendError::Full(_)) => {
                    self.skipped += 1;
                    warn!(
                        subscription = self.subscription,
                        skipped = self.skipped,
                        "subscriber is behind, dropping notification"
                    );
                    Delivery::Delivered
                }
                Err(TrySendError::Closed(_)) => Delivery::Stop,
            },
            OverflowPolicy::Lagged => match self.events.try_send(event) {
                Ok(()) => Delivery::Delivered,
                Err(TrySendError::Full(_)) => {
                    warn!(subscription = self.subscription, "subscriber lagged, ending subscription");
                    self.finish(RpcError::SubscriptionLagged {
                        subscription: self.subscription,
                        skipped: 1,
                    });
                    Delivery::Stop
                }
                Err(TrySendError::Closed(_)) => Delivery::Stop,
            },
        }
    }

    fn fail(mut self: Box<Self>, error: RpcError) {
        self.finish(error);
    }
}

enum Pending {
    Call(Reply<Response>),
    Subscribe {
        reply: Reply<u64>,
        sink: Box<dyn NotificationSink>,
        unsubscribe_method: String,
    },
    /// A subscribe whose caller gave up. Undone as soon as it is confirmed.
    Abandoned { unsubscribe_method: String },
    Unsubscribe(Option<Reply<()>>),
}

struct ActiveSubscription {
    unsubscribe_method: String,
    sink: Box<dyn NotificationSink>,
}

struct Connection {
    writer: SplitSink<WsStream, Message>,
    ids: RequestIds,
    pending: HashMap<u64, Pending>,
    subscriptions: HashMap<u64, ActiveSubscription>,
}

impl Connection {
    async fn run(
        mut self,
        mut reader: SplitStream<WsStream>,
        mut commands: mpsc::UnboundedReceiver<Command>,
        shutdown: CancellationToken,
        url: Url,
    ) {
        let outcome: Result<(), RpcError> = loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    let _ = self.writer.send(Message::Close(None)).await;
                    break Ok(());
                }
                Some(command) = commands.recv() => {
                    if let Err(e) = self.handle_command(command).await {
                        break Err(e);
                    }
                }
                frame = reader.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = self.handle_text(&text).await {
                            break Err(e);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(%url, ?frame, "websocket closed by server");
                        break Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Err(e.into()),
                    None => break Ok(()),
                },
            }
        };

        match &outcome {
            Ok(()) => info!(%url, "websocket connection closed"),
            Err(e) => error!(%url, error = %e, "websocket connection failed"),
        }

        shutdown.cancel();
        commands.close();
        while let Ok(command) = commands.try_recv() {
            command.fail(RpcError::ConnectionClosed);
        }
        for (_, pending) in self.pending.drain() {
            match pending {
                Pending::Call(reply) => {
                    let _ = reply.send(Err(RpcError::ConnectionClosed));
                }
                Pending::Subscribe { reply, sink, .. } => {
                    let _ = reply.send(Err(RpcError::ConnectionClosed));
                    sink.fail(RpcError::ConnectionClosed);
                }
                Pending::Unsubscribe(Some(reply)) => {
                    let _ = reply.send(Err(RpcError::ConnectionClosed));
                }
                Pending::Unsubscribe(None) | Pending::Abandoned { .. } => {}
            }
        }
        for (_, active) in self.subscriptions.drain() {
            active.sink.fail(RpcError::ConnectionClosed);
        }
    }

    async fn write(&mut self, payload: String) -> Result<(), RpcError> {
        self.writer.send(Message::Text(payload)).await?;
        Ok(())
    }

    async fn handle_command(&mut self, command: Command) -> Result<(), RpcError> {
        match command {
            Command::Request { id, payload, reply } => {
                self.pending.insert(id, Pending::Call(reply));
                self.write(payload).await
            }
            Command::Subscribe {
                id,
                payload,
                unsubscribe_method,
                sink,
                reply,
            } => {
                self.pending.insert(
                    id,
                    Pending::Subscribe {
                        reply,
                        sink,
                        unsubscribe_method,
                    },
                );
                self.write(payload).await
            }
            Command::Forget { id } => {
                match self.pending.remove(&id) {
                    Some(Pending::Subscribe {
                        unsubscribe_method, ..
                    }) => {
                        self.pending
                            .insert(id, Pending::Abandoned { unsubscribe_method });
                    }
                    Some(Pending::Unsubscribe(_)) => {
                        self.pending.insert(id, Pending::Unsubscribe(None));
                    }
                    Some(abandoned @ Pending::Abandoned { .. }) => {
                        self.pending.insert(id, abandoned);
                    }
                    Some(Pending::Call(_)) | None => {}
                }
                Ok(())
            }
            Command::Unsubscribe {
                subscription,
                reply,
            } => match self.subscriptions.remove(&subscription) {
                Some(active) => {
                    self.send_unsubscribe(subscription, active.unsubscribe_method, reply)
                        .await
                }
                None => {
                    if let Some(reply) = reply {
                        let _ = reply.send(Ok(()));
                    }
                    Ok(())
                }
            },
        }
    }

    async fn send_unsubscribe(
        &mut self,
        subscription: u64,
        method: String,
        reply: Option<Reply<()>>,
    ) -> Result<(), RpcError> {
        let id = self.ids.next();
        debug!(id, subscription, %method, "unsubscribe");
        let payload = serde_json::to_string(&RpcRequest::new(id, method, json!([subscription])))?;
        self.pending.insert(id, Pending::Unsubscribe(reply));
        self.write(payload).await
    }

    async fn handle_text(&mut self, text: &str) -> Result<(), RpcError> {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "malformed websocket frame");
                return Ok(());
            }
        };
        match value {
            Value::Array(items) => {
                for item in items {
                    self.handle_message(item).await?;
                }
                Ok(())
            }
            other => self.handle_message(other).await,
        }
    }

    async fn handle_message(&mut self, value: Value) -> Result<(), RpcError> {
        if value.get("method").is_some() {
            match serde_json::from_value::<Notification>(value) {
                Ok(notification) => self.notify(notification).await,
                Err(e) => {
                    warn!(error = %e, "malformed notification");
                    Ok(())
                }
            }
        } else {
            match serde_json::from_value::<Response>(value) {
                Ok(response) => self.resolve(response).await,
                Err(e) => {
                    warn!(error = %e, "malformed reply");
                    Ok(())
                }
            }
        }
    }

    async fn notify(&mut self, notification: Notification) -> Result<(), RpcError> {
        let subscription = notification.params.subscription;
        let Some(active) = self.subscriptions.get_mut(&subscription) else {
            warn!(subscription, method = %notification.method, "notification for unknown subscription");
            return Ok(());
        };
        if active.sink.deliver(notification.params.result).await == Delivery::Stop {
            if let Some(active) = self.subscriptions.remove(&subscription) {
                self.send_unsubscribe(subscription, active.unsubscribe_method, None)
                    .await?;
            }
        }
        Ok(())
    }

    async fn resolve(&mut self, response: Response) -> Result<(), RpcError> {
        let Some(id) = response.id else {
            warn!(error = ?response.error, "reply without id");
            return Ok(());
        };
        let Some(pending) = self.pending.remove(&id) else {
            warn!(id, "discarding reply for unknown or cancelled request");
            return Ok(());
        };

        match pending {
            Pending::Call(reply) => {
                if reply.send(Ok(response)).is_err() {
                    debug!(id, "caller went away before its reply");
                }
            }
            Pending::Subscribe {
                reply,
                mut sink,
                unsubscribe_method,
            } => match subscription_id(response) {
                Ok(subscription) => {
                    sink.bind(subscription);
                    if reply.send(Ok(subscription)).is_ok() {
                        debug!(id, subscription, "subscribed");
                        self.subscriptions.insert(
                            subscription,
                            ActiveSubscription {
                                unsubscribe_method,
                                sink,
                            },
                        );
                    } else {
                        self.send_unsubscribe(subscription, unsubscribe_method, None)
                            .await?;
                    }
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            },
            Pending::Abandoned { unsubscribe_method } => {
                if let Ok(subscription) = subscription_id(response) {
                    self.send_unsubscribe(subscription, unsubscribe_method, None)
                        .await?;
                }
            }
            Pending::Unsubscribe(reply) => {
                let outcome = response.into_result().and_then(|value| match value {
                    Value::Bool(true) => Ok(()),
                    other => Err(RpcError::InvalidResponse(format!(
                        "unsubscribe returned {other}"
                    ))),
                });
                match reply {
                    Some(reply) => {
                        let _ = reply.send(outcome);
                    }
                    None => {
                        if let Err(e) = outcome {
                            warn!(id, error = %e, "unsubscribe failed");
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn subscription_id(response: Response) -> Result<u64, RpcError> {
    let value = response.into_result()?;
    value
        .as_u64()
        .ok_or_else(|| RpcError::InvalidResponse(format!("subscription id {value}")))
}

/// Tells the connection task to drop a request's waiter if the caller's
/// future is dropped before the reply arrives.
struct PendingGuard {
    id: u64,
    commands: mpsc::UnboundedSender<Command>,
    armed: bool,
}

impl PendingGuard {
    fn new(id: u64, commands: mpsc::UnboundedSender<Command>) -> Self {
        Self {
            id,
            commands,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.commands.send(Command::Forget { id: self.id });
        }
    }
}

/// Handle to a websocket connection. Dropping it closes the connection.
pub struct PubsubClient {
    commands: mpsc::UnboundedSender<Command>,
    url: Url,
    shutdown: CancellationToken,
    ids: RequestIds,
    capacity: usize,
    overflow: OverflowPolicy,
    request_timeout: Duration,
}

impl PubsubClient {
    /// Connects to `config.websocket_url()`. `ids` must be the counter used
    /// by whatever dispatcher sends requests over this connection.
    pub async fn connect(config: &RpcClientConfig, ids: RequestIds) -> Result<Self, RpcError> {
        config.validate()?;
        let url = config.websocket_url()?;
        let timeout = config.request_timeout();

        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(config.max_response_size);
        ws_config.max_frame_size = Some(config.max_response_size);

        let connect =
            tokio_tungstenite::connect_async_with_config(url.as_str(), Some(ws_config), false);
        let (socket, _) = tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| RpcError::Timeout(timeout))??;
        info!(%url, "websocket connected");

        let (writer, reader) = socket.split();
        let (commands, receiver) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let connection = Connection {
            writer,
            ids: ids.clone(),
            pending: HashMap::new(),
            subscriptions: HashMap::new(),
        };
        tokio::spawn(connection.run(reader, receiver, shutdown.clone(), url.clone()));

        Ok(Self {
            commands,
            url,
            shutdown,
            ids,
            capacity: config.subscription_capacity,
            overflow: config.overflow,
            request_timeout: timeout,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Closes the connection. Outstanding calls and subscriptions end with
    /// [`RpcError::ConnectionClosed`].
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    /// Opens a subscription. The returned handle yields notifications in
    /// server order.
    pub async fn subscribe<T: DeserializeOwned + Send + 'static>(
        &self,
        method: &str,
        unsubscribe_method: &str,
        params: Value,
    ) -> Result<Subscription<T>, RpcError> {
        let id = self.ids.next();
        let payload = serde_json::to_string(&RpcRequest::new(id, method, params))?;
        let (events_tx, events) = mpsc::channel(self.capacity);
        let (errors_tx, errors) = oneshot::channel();
        let sink = TypedSink {
            subscription: 0,
            events: events_tx,
            errors: Some(errors_tx),
            policy: self.overflow,
            skipped: 0,
        };

        debug!(id, method, "subscribe");
        let (reply, receiver) = oneshot::channel();
        self.commands
            .send(Command::Subscribe {
                id,
                payload,
                unsubscribe_method: unsubscribe_method.to_string(),
                sink: Box::new(sink),
                reply,
            })
            .map_err(|_| RpcError::ConnectionClosed)?;

        let mut guard = PendingGuard::new(id, self.commands.clone());
        let outcome = receiver.await;
        guard.disarm();
        let subscription = outcome.map_err(|_| RpcError::ConnectionClosed)??;

        Ok(Subscription {
            id: subscription,
            events,
            errors: Some(errors),
            commands: self.commands.clone(),
            timeout: self.request_timeout,
            active: true,
        })
    }
}

impl Drop for PubsubClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl RpcSender for PubsubClient {
    async fn send(&self, request: RpcRequest) -> Result<Response, RpcError> {
        let id = request.id;
        debug!(id, method = %request.method, "websocket request");
        let payload = serde_json::to_string(&request)?;
        let (reply, receiver) = oneshot::channel();
        self.commands
            .send(Command::Request { id, payload, reply })
            .map_err(|_| RpcError::ConnectionClosed)?;

        let mut guard = PendingGuard::new(id, self.commands.clone());
        let outcome = receiver.await;
        guard.disarm();
        outcome.map_err(|_| RpcError::ConnectionClosed)?
    }

    /// Websocket servers do not batch; the requests go out individually
    /// and are awaited together.
    async fn send_batch(&self, requests: Vec<RpcRequest>) -> Result<Vec<Response>, RpcError> {
        futures::future::try_join_all(requests.into_iter().map(|request| self.send(request))).await
    }

    fn url(&self) -> String {
        self.url.to_string()
    }
}

/// A live subscription.
///
/// Notifications arrive through [`next`](Self::next) (or the [`Stream`]
/// impl) in the order the server sent them. When the event channel ends,
/// [`closed`](Self::closed) reports why: `None` after a clean unsubscribe,
/// otherwise the terminating error. Dropping the handle unsubscribes.
pub struct Subscription<T> {
    id: u64,
    events: mpsc::Receiver<T>,
    errors: Option<oneshot::Receiver<RpcError>>,
    commands: mpsc::UnboundedSender<Command>,
    timeout: Duration,
    active: bool,
}

impl<T> Subscription<T> {
    /// Server-assigned subscription id.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn next(&mut self) -> Option<T> {
        self.events.recv().await
    }

    /// Waits for the subscription to end. Resolves once; later calls
    /// return `None` immediately.
    pub async fn closed(&mut self) -> Option<RpcError> {
        match self.errors.take() {
            Some(errors) => errors.await.ok(),
            None => None,
        }
    }

    /// Stops delivery and tells the server. Events still buffered are
    /// discarded.
    pub async fn unsubscribe(&mut self) -> Result<(), RpcError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.events.close();
        while self.events.try_recv().is_ok() {}

        let (reply, receiver) = oneshot::channel();
        self.commands
            .send(Command::Unsubscribe {
                subscription: self.id,
                reply: Some(reply),
            })
            .map_err(|_| RpcError::ConnectionClosed)?;
        match tokio::time::timeout(self.timeout, receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(RpcError::ConnectionClosed),
            Err(_) => Err(RpcError::Timeout(self.timeout)),
        }
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().events.poll_recv(cx)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.commands.send(Command::Unsubscribe {
                subscription: self.id,
                reply: None,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sink<T>(
        capacity: usize,
        policy: OverflowPolicy,
    ) -> (TypedSink<T>, mpsc::Receiver<T>, oneshot::Receiver<RpcError>) {
        let (events, rx) = mpsc::channel(capacity);
        let (errors, err_rx) = oneshot::channel();
        let sink = TypedSink {
            subscription: 9,
            events,
            errors: Some(errors),
            policy,
            skipped: 0,
        };
        (sink, rx, err_rx)
    }

    #[tokio::test]
    async fn lagged_policy_ends_subscription() {
        let (mut sink, mut rx, mut err_rx) = sink::<u64>(1, OverflowPolicy::Lagged);
        assert_eq!(sink.deliver(json!(1)).await, Delivery::Delivered);
        assert_eq!(sink.deliver(json!(2)).await, Delivery::Stop);
        assert_eq!(rx.recv().await, Some(1));
        match err_rx.try_recv() {
            Ok(RpcError::SubscriptionLagged {
                subscription,
                skipped,
            }) => {
                assert_eq!(subscription, 9);
                assert_eq!(skipped, 1);
            }
            other => panic!("expected lag error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn drop_newest_policy_keeps_going() {
        let (mut sink, mut rx, mut err_rx) = sink::<u64>(1, OverflowPolicy::DropNewest);
        assert_eq!(sink.deliver(json!(1)).await, Delivery::Delivered);
        assert_eq!(sink.deliver(json!(2)).await, Delivery::Delivered);
        assert_eq!(sink.skipped, 1);
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(sink.deliver(json!(3)).await, Delivery::Delivered);
        assert_eq!(rx.recv().await, Some(3));
        assert!(err_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn backpressure_waits_for_reader() {
        let (mut sink, mut rx, _err_rx) = sink::<u64>(1, OverflowPolicy::Backpressure);
        assert_eq!(sink.deliver(json!(1)).await, Delivery::Delivered);
        let reader = tokio::spawn(async move {
            let first = rx.recv().await;
            let second = rx.recv().await;
            (first, second)
        });
        assert_eq!(sink.deliver(json!(2)).await, Delivery::Delivered);
        drop(sink);
        assert_eq!(reader.await.unwrap(), (Some(1), Some(2)));
    }

    #[tokio::test]
    async fn closed_receiver_stops_delivery() {
        let (mut sink, rx, _err_rx) = sink::<u64>(4, OverflowPolicy::Lagged);
        drop(rx);
        assert_eq!(sink.deliver(json!(1)).await, Delivery::Stop);
    }

    #[tokio::test]
    async fn undecodable_notification_is_reported() {
        let (mut sink, _rx, mut err_rx) = sink::<u64>(4, OverflowPolicy::Lagged);
        assert_eq!(sink.deliver(json!("not a number")).await, Delivery::Stop);
        assert!(matches!(err_rx.try_recv(), Ok(RpcError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn failing_sink_reports_error_once() {
        let (sink, _rx, err_rx) = sink::<u64>(4, OverflowPolicy::Lagged);
        Box::new(sink).fail(RpcError::ConnectionClosed);
        assert!(matches!(err_rx.await, Ok(RpcError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn dropped_sink_is_a_clean_close() {
        let (sink, rx, err_rx) = sink::<u64>(4, OverflowPolicy::Lagged);
        drop(sink);
        let (commands, _) = mpsc::unbounded_channel();
        let mut subscription = Subscription {
            id: 9,
            events: rx,
            errors: Some(err_rx),
            commands,
            timeout: Duration::from_secs(1),
            active: false,
        };
        assert_eq!(subscription.next().await, None);
        assert!(subscription.closed().await.is_none());
        assert!(subscription.closed().await.is_none());
    }
}
