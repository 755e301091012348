//! Backend trait for mail delivery.
//!
//! The mailer only knows this trait; the SMTP client and the recording
//! transport used in tests are interchangeable behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while handing a message to a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The message was rejected or the relay could not be reached
    #[error("Message could not be sent: {0}")]
    DeliveryFailed(String),

    /// The relay or sender settings are unusable; nothing was sent
    #[error("Invalid SMTP configuration: {0}")]
    InvalidConfig(String),
}

/// A composed message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,

    /// Plain-text body, also the alternative part of HTML mail
    pub text: String,

    /// HTML body; sent as the preferred part of a multipart message
    pub html: Option<String>,
}

/// Mail delivery backend.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver `message` and return the transport-assigned message id.
    async fn send(&self, message: &OutgoingMessage) -> Result<String, TransportError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
