//! Eviction event pub/sub. A JSON envelope is published whenever a client's
//! secret rotates so every process caching that client can evict its entry.
//! Pub/sub is advisory: a missed or malformed event only delays invalidation
//! until the next cache-miss reload, it never blocks the write path.

use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    pub event_type: String,
    pub id: String,
    pub timestamp: i64,
    pub data: serde_json::Value,
}

impl Envelope {
    /// `client` is serialized as-is into `data`: the full client record
    /// (minus any secret, which the `Client` type never carries), matching
    /// the wire format external subscribers rely on. The internal eviction
    /// subscriber only reads `data.id` back out.
    pub fn client_secret_rotated(client: &impl Serialize, event_id: &str) -> Self {
        Self {
            event_type: "client.secret.rotated".to_string(),
            id: event_id.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            data: serde_json::to_value(client).unwrap_or(serde_json::Value::Null),
        }
    }

    /// The client id an eviction event refers to, if this envelope carries one.
    pub fn target_client_id(&self) -> Option<&str> {
        self.data.get("id").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PubSubError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, channel: &str, envelope: &Envelope) -> Result<(), PubSubError>;
}

#[async_trait]
pub trait Subscription: Send {
    /// Waits for the next message, decoding its JSON payload into an
    /// envelope. Returns `None` once the underlying channel is closed.
    /// Malformed payloads are logged and skipped, never surfaced as errors.
    async fn recv(&mut self) -> Option<Envelope>;
}

pub struct RedisPubSub {
    client: redis::Client,
}

impl RedisPubSub {
    pub fn new(redis_url: &str) -> Result<Self, PubSubError> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
        })
    }

    pub async fn subscribe(&self, channel: &str) -> Result<RedisSubscription, PubSubError> {
        let conn = self.client.get_async_connection().await?;
        let mut pubsub = conn.into_pubsub();
        pubsub.subscribe(channel).await?;
        Ok(RedisSubscription { pubsub })
    }
}

#[async_trait]
impl Publisher for RedisPubSub {
    async fn publish(&self, channel: &str, envelope: &Envelope) -> Result<(), PubSubError> {
        let payload = serde_json::to_string(envelope)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: i64 = conn.publish(channel, payload).await?;
        Ok(())
    }
}

pub struct RedisSubscription {
    pubsub: redis::aio::PubSub,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn recv(&mut self) -> Option<Envelope> {
        loop {
            let msg = self.pubsub.on_message().next().await?;
            let payload: String = match msg.get_payload() {
                Ok(p) => p,
                Err(e) => {
                    warn!("dropping unreadable pub/sub message: {}", e);
                    continue;
                }
            };

            match serde_json::from_str::<Envelope>(&payload) {
                Ok(envelope) => return Some(envelope),
                Err(e) => {
                    warn!("dropping malformed pub/sub envelope: {}", e);
                    continue;
                }
            }
        }
    }
}

/// In-memory stand-in for Redis, used by the test harness so integration
/// tests exercise the same cache-eviction path without a live broker.
#[derive(Clone)]
pub struct InMemoryPubSub {
    sender: tokio::sync::broadcast::Sender<Envelope>,
}

impl InMemoryPubSub {
    pub fn new() -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(256);
        Self { sender }
    }

    pub fn subscribe(&self) -> InMemorySubscription {
        InMemorySubscription {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for InMemoryPubSub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for InMemoryPubSub {
    async fn publish(&self, _channel: &str, envelope: &Envelope) -> Result<(), PubSubError> {
        // No subscribers is not an error: the event is advisory.
        let _ = self.sender.send(envelope.clone());
        Ok(())
    }
}

pub struct InMemorySubscription {
    receiver: tokio::sync::broadcast::Receiver<Envelope>,
}

#[async_trait]
impl Subscription for InMemorySubscription {
    async fn recv(&mut self) -> Option<Envelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_client() -> serde_json::Value {
        serde_json::json!({
            "id": "cli_123",
            "name": "worker-1",
            "version": 1,
            "workspace_id": "ws_1",
            "for_workspace_id": null,
            "api_id": "api_1",
            "rate_limit_bucket_size": null,
            "rate_limit_refill_amount": null,
            "rate_limit_refill_interval_ms": null,
            "created_at": "2026-01-01T00:00:00Z",
        })
    }

    #[tokio::test]
    async fn published_envelope_reaches_the_subscriber() {
        let pubsub = InMemoryPubSub::new();
        let mut sub = pubsub.subscribe();

        let envelope = Envelope::client_secret_rotated(&sample_client(), "evt_1");
        pubsub.publish("clients", &envelope).await.unwrap();

        let received = sub.recv().await.unwrap();
        assert_eq!(received, envelope);
        assert_eq!(received.target_client_id(), Some("cli_123"));
        assert_eq!(received.data.get("version"), Some(&serde_json::json!(1)));
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_error() {
        let pubsub = InMemoryPubSub::new();
        let envelope = Envelope::client_secret_rotated(&sample_client(), "evt_1");
        assert!(pubsub.publish("clients", &envelope).await.is_ok());
    }
}
