//! Event publisher trait and the `email_sent` event.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mailer::SendResult;

/// Name of the event emitted after every successful send
pub const EMAIL_SENT_EVENT: &str = "email_sent";

/// Errors that can occur while publishing an event.
#[derive(Debug, Error)]
pub enum EventError {
    /// Redis operation failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Event carrying the fields of a completed send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSentEvent {
    /// Always [`EMAIL_SENT_EVENT`]
    pub event: String,

    #[serde(flatten)]
    pub result: SendResult,
}

impl EmailSentEvent {
    pub fn new(result: SendResult) -> Self {
        Self {
            event: EMAIL_SENT_EVENT.to_string(),
            result,
        }
    }
}

/// Destination for application events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &EmailSentEvent) -> Result<(), EventError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
