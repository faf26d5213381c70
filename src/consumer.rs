//! The long-lived worker loop: receive → decode → route → reply.
//!
//! State machine:
//!
//! ```text
//!  [Idle] --start--> [Connecting] --ok--> [Consuming] --cancel--> [Draining] --> [Stopped]
//!                        |  fail                |
//!                        v                       v
//!                    [FatalExit]             [Consuming]  (per-message errors never leave this state)
//! ```
//!
//! Connection/channel establishment failures are the only fatal path — they
//! are logged at `tracing::error!` with a `fatal = true` field and rethrown
//! so the process host restarts the worker. Every per-delivery failure,
//! including a handler panic, is caught and turned into an error reply;
//! `tokio::spawn` per delivery gives this for free even against panics.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use lapin::options::{
    BasicCancelOptions, BasicConsumeOptions, BasicPublishOptions, QueueDeclareOptions,
};
use lapin::types::{AMQPValue, FieldTable, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tokio_util::sync::CancellationToken;

use crate::config::BrokerSettings;
use crate::envelope::{BusMessage, RpcEnvelope, RpcError};
use crate::router::BusRouter;

/// A long-lived worker bound to one request queue and one [`BusRouter`].
pub struct Consumer {
    channel: Channel,
    queue: String,
    router: Arc<BusRouter>,
}

impl Consumer {
    /// Opens a connection and channel to the broker, declares `queue` as
    /// durable/non-exclusive/non-auto-delete, and returns a `Consumer` ready
    /// to [`run`](Self::run). Connection failures are logged at `fatal` and
    /// returned to the caller — the only fatal path in this component.
    pub async fn connect(
        settings: &BrokerSettings,
        queue: impl Into<String>,
        router: Arc<BusRouter>,
    ) -> Result<Self> {
        let queue = queue.into();
        let connection =
            Connection::connect(&settings.amqp_uri(), ConnectionProperties::default())
                .await
                .inspect_err(|e| {
                    tracing::error!(fatal = true, error = %e, "failed to connect to broker");
                })
                .context("consumer: broker connect failed")?;

        let channel = connection.create_channel().await.inspect_err(|e| {
            tracing::error!(fatal = true, error = %e, "failed to open channel");
        })?;

        channel
            .queue_declare(
                &queue,
                QueueDeclareOptions {
                    durable: true,
                    exclusive: false,
                    auto_delete: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .inspect_err(|e| {
                tracing::error!(fatal = true, error = %e, queue = %queue, "failed to declare queue");
            })?;

        Ok(Self {
            channel,
            queue,
            router,
        })
    }

    /// Consumes deliveries until `cancel` fires. Per-delivery processing is
    /// cooperative: each delivery is handled on its own task so one slow or
    /// poisoned message never blocks the next. Delivery acknowledgement is
    /// automatic (`no_ack: true`) — redelivery bookkeeping is out of scope.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let consumer_tag = format!("rpc-bus-{}", uuid::Uuid::new_v4().simple());
        let mut consumer = self
            .channel
            .basic_consume(
                &self.queue,
                &consumer_tag,
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .context("consumer: failed to register consumer")?;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(queue = %self.queue, "cancellation requested, draining");
                    let _ = self
                        .channel
                        .basic_cancel(&consumer_tag, BasicCancelOptions::default())
                        .await;
                    return Ok(());
                }
                delivery = consumer.next() => {
                    match delivery {
                        Some(Ok(delivery)) => {
                            let router = Arc::clone(&self.router);
                            let channel = self.channel.clone();
                            let reply_to = delivery.properties.reply_to().clone();
                            let correlation_id = delivery.properties.correlation_id().clone();
                            let body = delivery.data;
                            tokio::spawn(async move {
                                handle_delivery(router, channel, reply_to, correlation_id, body).await;
                            });
                        }
                        Some(Err(e)) => {
                            tracing::error!(error = %e, "broker reported a delivery error");
                        }
                        None => return Ok(()),
                    }
                }
            }
        }
    }
}

/// Decodes, routes, and replies for one delivery. Never panics out of this
/// function's own control flow — a panic inside the routed handler is
/// caught by the inner `tokio::spawn`/`join` below and still produces a
/// reply.
async fn handle_delivery(
    router: Arc<BusRouter>,
    channel: Channel,
    reply_to: Option<ShortString>,
    correlation_id: Option<ShortString>,
    body: Vec<u8>,
) {
    let (ok, payload) = match tokio::spawn(async move { process_delivery(&router, &body).await })
        .await
    {
        Ok(result) => result,
        Err(join_err) => {
            tracing::error!(error = %join_err, "handler task panicked");
            let envelope: RpcEnvelope<String> = RpcEnvelope::failure(RpcError {
                code: "UNHANDLED".to_string(),
                message: "handler panicked".to_string(),
                details: Some(join_err.to_string()),
            });
            (false, encode(&envelope))
        }
    };

    reply(&channel, reply_to, correlation_id, ok, payload).await;
}

/// Decodes `body` as a [`BusMessage`] and routes it, returning whether the
/// reply is a success and the encoded [`RpcEnvelope`] bytes to publish.
/// Pure apart from the router dispatch — no broker dependency — so this is
/// the unit under test for the "liveness under poison" property.
pub async fn process_delivery(router: &BusRouter, body: &[u8]) -> (bool, Vec<u8>) {
    let envelope: RpcEnvelope<String> = match serde_json::from_slice::<BusMessage>(body) {
        Ok(msg) => match router.route(&msg).await {
            Ok(result) => RpcEnvelope::success(result),
            Err(err) => RpcEnvelope::failure(err.into_rpc_error()),
        },
        Err(e) => RpcEnvelope::failure(RpcError {
            code: "DESERIALIZE_ERROR".to_string(),
            message: "Invalid payload.".to_string(),
            details: Some(e.to_string()),
        }),
    };
    let ok = envelope.ok;
    (ok, encode(&envelope))
}

fn encode(envelope: &RpcEnvelope<String>) -> Vec<u8> {
    serde_json::to_vec(envelope).unwrap_or_else(|_| {
        br#"{"ok":false,"error":{"code":"INTERNAL_SERVER_ERROR","message":"failed to encode reply"}}"#
            .to_vec()
    })
}

/// Publishes the reply to the default exchange using `replyTo` as routing
/// key, copying `correlationId` and setting `x-status`. Skipped (with a
/// `warn` log) when the delivery carried no `replyTo`.
async fn reply(
    channel: &Channel,
    reply_to: Option<ShortString>,
    correlation_id: Option<ShortString>,
    ok: bool,
    body: Vec<u8>,
) {
    let Some(reply_to) = reply_to else {
        tracing::warn!("delivery has no replyTo, dropping reply");
        return;
    };

    let mut headers = FieldTable::default();
    headers.insert(
        "x-status".into(),
        AMQPValue::LongString(if ok { "ok" } else { "error" }.into()),
    );

    let mut props = BasicProperties::default()
        .with_content_type("application/json".into())
        .with_content_encoding("utf-8".into())
        .with_headers(headers);
    if let Some(correlation_id) = correlation_id {
        props = props.with_correlation_id(correlation_id);
    }

    if let Err(e) = channel
        .basic_publish(
            "",
            reply_to.as_str(),
            BasicPublishOptions::default(),
            &body,
            props,
        )
        .await
    {
        tracing::error!(error = %e, reply_to = %reply_to, "failed to publish reply");
    }
}
