//! Redis Pub/Sub event publisher.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tokio::sync::RwLock;

use super::publisher::{EmailSentEvent, EventError, EventPublisher};

/// Publishes events as JSON on a Redis channel.
///
/// The connection is opened lazily on first publish and reused; it is
/// dropped after a connection error so the next publish reconnects.
pub struct RedisPublisher {
    client: Client,
    connection: RwLock<Option<MultiplexedConnection>>,
    channel: String,
}

impl RedisPublisher {
    pub fn new(url: &str, channel: impl Into<String>) -> Result<Self, EventError> {
        let client = Client::open(url)?;

        Ok(Self {
            client,
            connection: RwLock::new(None),
            channel: channel.into(),
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection, EventError> {
        {
            let conn = self.connection.read().await;
            if let Some(ref c) = *conn {
                return Ok(c.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // Double-check in case another task connected while we waited
        if let Some(ref c) = *conn_guard {
            return Ok(c.clone());
        }

        let conn = self.client.get_multiplexed_tokio_connection().await?;
        *conn_guard = Some(conn.clone());
        tracing::info!(channel = %self.channel, "Redis event publisher connected");
        Ok(conn)
    }
}

#[async_trait]
impl EventPublisher for RedisPublisher {
    async fn publish(&self, event: &EmailSentEvent) -> Result<(), EventError> {
        let payload = serde_json::to_string(event)?;
        let mut conn = self.get_connection().await?;

        let result: redis::RedisResult<i64> = conn.publish(&self.channel, &payload).await;
        match result {
            Ok(receivers) => {
                tracing::debug!(
                    channel = %self.channel,
                    receivers = receivers,
                    message_id = %event.result.message_id,
                    "Published email_sent event"
                );
                Ok(())
            }
            Err(e) => {
                if e.is_connection_dropped() || e.is_io_error() {
                    let mut conn_guard = self.connection.write().await;
                    *conn_guard = None;
                }
                Err(EventError::Redis(e))
            }
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            RedisPublisher::new("not a url", "email_sent"),
            Err(EventError::Redis(_))
        ));
    }

    #[test]
    fn test_channel_name() {
        let publisher = RedisPublisher::new("redis://localhost:6379", "mail:sent").unwrap();
        assert_eq!(publisher.channel(), "mail:sent");
    }
}
