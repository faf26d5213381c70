//! The calling side: publish a request, wait for its correlated reply.
//!
//! One exclusive, auto-delete, non-durable reply queue is declared per call
//! rather than sharing one queue across concurrent calls — simpler
//! lifecycle, and the broker handles the fan-in. The connection and channel
//! are opened lazily on first use and kept for subsequent calls.

use std::time::Duration;

use futures::{Stream, StreamExt};
use lapin::options::{
    BasicAckOptions, BasicCancelOptions, BasicConsumeOptions, BasicPublishOptions,
    QueueDeclareOptions, QueueDeleteOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tokio::sync::Mutex;

use crate::config::BrokerSettings;
use crate::envelope::{BusMessage, RpcEnvelope, RpcError};
use crate::error::AppError;

/// A lazily-connected client for sending request/reply calls over the bus.
pub struct Producer {
    settings: BrokerSettings,
    state: Mutex<Option<(Connection, Channel)>>,
}

/// One delivery off a reply stream, stripped of any transport type so the
/// correlation/timeout loop below can be driven by a fake in tests.
pub(crate) struct RawReply {
    pub correlation_id: Option<String>,
    pub body: Vec<u8>,
}

impl Producer {
    pub fn new(settings: BrokerSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(None),
        }
    }

    async fn channel(&self) -> Result<Channel, AppError> {
        let mut guard = self.state.lock().await;
        if let Some((_, channel)) = guard.as_ref() {
            if channel.status().connected() {
                return Ok(channel.clone());
            }
        }
        let connection =
            Connection::connect(&self.settings.amqp_uri(), ConnectionProperties::default())
                .await
                .map_err(|e| {
                    AppError::internal("TRANSPORT_CONNECT_FAILED", "failed to connect to broker")
                        .with_details(e.to_string())
                })?;
        let channel = connection.create_channel().await.map_err(|e| {
            AppError::internal("TRANSPORT_CONNECT_FAILED", "failed to open channel")
                .with_details(e.to_string())
        })?;
        *guard = Some((connection, channel.clone()));
        Ok(channel)
    }

    /// Publishes `msg` to `queue` and waits for the correlated reply, up to
    /// the broker settings' configured timeout. Always cleans up its reply
    /// queue and consumer, whether the call succeeds, fails, or times out.
    pub async fn call(&self, queue: &str, msg: &BusMessage) -> Result<String, AppError> {
        let channel = self.channel().await?;
        let correlation_id = uuid::Uuid::new_v4().simple().to_string();

        let reply_queue = channel
            .queue_declare(
                "",
                QueueDeclareOptions {
                    exclusive: true,
                    auto_delete: true,
                    durable: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                AppError::internal("TRANSPORT_ERROR", "failed to declare reply queue")
                    .with_details(e.to_string())
            })?;
        let reply_queue_name = reply_queue.name().to_string();

        let consumer_tag = format!("rpc-bus-reply-{correlation_id}");
        let consumer = channel
            .basic_consume(
                &reply_queue_name,
                &consumer_tag,
                BasicConsumeOptions {
                    no_ack: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                AppError::internal("TRANSPORT_ERROR", "failed to consume reply queue")
                    .with_details(e.to_string())
            })?;

        let body = serde_json::to_vec(msg).map_err(AppError::from_unhandled)?;
        let props = BasicProperties::default()
            .with_correlation_id(correlation_id.clone().into())
            .with_reply_to(reply_queue_name.clone().into())
            .with_content_type("application/json".into())
            .with_content_encoding("utf-8".into());

        if let Err(e) = channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                &body,
                props,
            )
            .await
        {
            cleanup(&channel, &consumer_tag, &reply_queue_name).await;
            return Err(
                AppError::internal("TRANSPORT_ERROR", "failed to publish request")
                    .with_details(e.to_string()),
            );
        }

        let stream = consumer.filter_map(|delivery| async move {
            let delivery = delivery.ok()?;
            let correlation_id = delivery.properties.correlation_id().as_ref().map(|c| c.to_string());
            let body = delivery.data.clone();
            let acker = delivery.acker.clone();
            let _ = acker.ack(BasicAckOptions::default()).await;
            Some(RawReply { correlation_id, body })
        });

        let result = await_correlated(stream, &correlation_id, self.settings.timeout()).await;
        cleanup(&channel, &consumer_tag, &reply_queue_name).await;

        // Mirror image of `AppError::into_rpc_error` on the consumer side.
        result.and_then(|envelope| {
            if envelope.ok {
                Ok(envelope.data.unwrap_or_default())
            } else {
                Err(AppError::from_remote(envelope.error.unwrap_or(RpcError {
                    code: "UNKNOWN".to_string(),
                    message: "remote reported failure without an error body".to_string(),
                    details: None,
                })))
            }
        })
    }
}

/// Reads `stream` until a reply whose `correlationId` matches `correlation_id`
/// arrives, or `timeout` elapses. Replies for any other correlation id are
/// discarded and waiting continues — defends against a misrouted or stale
/// delivery landing on a queue meant for one call. No broker dependency, so
/// this is the unit under test for the correlation and timeout properties.
pub(crate) async fn await_correlated<S>(
    stream: S,
    correlation_id: &str,
    timeout: Duration,
) -> Result<RpcEnvelope<String>, AppError>
where
    S: Stream<Item = RawReply>,
{
    tokio::pin!(stream);
    let sleep = tokio::time::sleep(timeout);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => {
                return Err(AppError::gateway_timeout(
                    "TIMEOUT",
                    "no response within the configured wait time",
                ));
            }
            item = stream.next() => {
                match item {
                    Some(reply) if reply.correlation_id.as_deref() == Some(correlation_id) => {
                        // Compatibility path: a reply that doesn't decode as an
                        // `RpcEnvelope` is treated as a bare successful body
                        // rather than a transport failure.
                        return Ok(serde_json::from_slice(&reply.body).unwrap_or_else(|_| {
                            RpcEnvelope::success(String::from_utf8_lossy(&reply.body).into_owned())
                        }));
                    }
                    Some(_stale) => continue,
                    None => {
                        return Err(AppError::internal(
                            "TRANSPORT_CLOSED",
                            "reply stream ended before a correlated reply arrived",
                        ));
                    }
                }
            }
        }
    }
}

async fn cleanup(channel: &Channel, consumer_tag: &str, reply_queue: &str) {
    if let Err(e) = channel
        .basic_cancel(consumer_tag, BasicCancelOptions::default())
        .await
    {
        tracing::debug!(error = %e, consumer_tag, "failed to cancel reply consumer");
    }
    if let Err(e) = channel
        .queue_delete(reply_queue, QueueDeleteOptions::default())
        .await
    {
        tracing::debug!(error = %e, reply_queue, "failed to delete reply queue");
    }
}
