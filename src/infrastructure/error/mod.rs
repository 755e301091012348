use thiserror::Error;

use crate::events::EventError;
use crate::storage::StorageError;
use crate::template::TemplateError;
use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Email template '{template_id}' did not exist within '{dir}'")]
    TemplateNotFound { template_id: String, dir: String },

    #[error("Message could not be sent: {0}")]
    DeliveryFailed(String),

    #[error("Failed to record sent email: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to publish email event: {0}")]
    Publish(#[from] EventError),
}

impl MailerError {
    /// Short stage label used for logs and failure metrics
    pub fn stage(&self) -> &'static str {
        match self {
            MailerError::Config(_) => "config",
            MailerError::InvalidRecipient(_) => "recipient",
            MailerError::TemplateNotFound { .. } => "template",
            MailerError::DeliveryFailed(_) => "delivery",
            MailerError::Storage(_) => "storage",
            MailerError::Publish(_) => "event",
        }
    }
}

impl From<TemplateError> for MailerError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::NotFound { template_id, dir } => {
                MailerError::TemplateNotFound { template_id, dir }
            }
        }
    }
}

impl From<TransportError> for MailerError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::DeliveryFailed(msg) => MailerError::DeliveryFailed(msg),
            TransportError::InvalidConfig(msg) => {
                MailerError::Config(config::ConfigError::Message(msg))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MailerError>;
