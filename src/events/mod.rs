//! Application events emitted after a send.
//!
//! # Publisher Architecture
//!
//! - `BroadcastPublisher`: in-process bus on a tokio broadcast channel
//! - `RedisPublisher`: JSON messages on a Redis Pub/Sub channel
//!
//! Use `create_event_publisher()` to pick one from configuration.

mod broadcast;
mod publisher;
mod redis_publisher;

use std::sync::Arc;

use crate::config::EventsConfig;

pub use broadcast::BroadcastPublisher;
pub use publisher::{EmailSentEvent, EventError, EventPublisher, EMAIL_SENT_EVENT};
pub use redis_publisher::RedisPublisher;

/// Create an event publisher based on configuration.
///
/// - `"redis"`: a `RedisPublisher` on `settings.channel`
/// - `"memory"`: a `BroadcastPublisher`
/// - anything else (default `"none"`): no publisher
pub fn create_event_publisher(
    settings: &EventsConfig,
) -> Result<Option<Arc<dyn EventPublisher>>, EventError> {
    match settings.backend.as_str() {
        "redis" => {
            tracing::info!(
                backend = "redis",
                channel = %settings.channel,
                "Creating Redis event publisher"
            );
            Ok(Some(Arc::new(RedisPublisher::new(
                &settings.redis_url,
                settings.channel.clone(),
            )?)))
        }
        "memory" => {
            tracing::info!(backend = "memory", "Creating in-process event publisher");
            Ok(Some(Arc::new(BroadcastPublisher::new(settings.capacity))))
        }
        "none" => Ok(None),
        other => {
            tracing::warn!(backend = %other, "Unknown events backend, events disabled");
            Ok(None)
        }
    }
}
